//! Per-session thread bookkeeping and finisher election.

use super::ExecutionStatus;
use crate::events::EventSink;
use crate::utils::{elapsed_ms, now_utc, Timestamp};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// The outcome handed to the unique finishing thread of a session.
///
/// The caller owns persistence and reporting of the finalized session; the
/// tracker only computes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedSession {
    /// The finished session.
    pub session_id: String,
    /// The chain the session belongs to; `None` if the session was never
    /// registered (sole-thread path).
    pub chain_id: Option<String>,
    /// Overall status: the max-merge of every recorded thread status.
    pub status: ExecutionStatus,
    /// Wall-clock duration from registration to finalization.
    pub duration_ms: u64,
}

/// Shared bookkeeping for one live session.
struct SessionEntry {
    chain_id: String,
    started_at: Timestamp,
    /// Threads still working on this session.
    active_threads: AtomicI64,
    /// Per-thread outcomes, append-only until the finisher reads them.
    thread_statuses: DashMap<String, ExecutionStatus>,
}

/// Tracks thread completion across every live session.
///
/// Each session's branches run as independent engine tasks; all of them call
/// [`SessionTracker::on_thread_finished`], and only the one whose atomic
/// decrement drives the counter to zero receives the [`FinalizedSession`]. The decrement-and-test is a single atomic
/// operation, not a read-then-compare, so two threads can never both elect
/// themselves.
pub struct SessionTracker {
    sessions: DashMap<String, Arc<SessionEntry>>,
    sink: Arc<dyn EventSink>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    /// Creates a tracker that discards finalization events.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            sink: Arc::new(crate::events::NoOpEventSink),
        }
    }

    /// Creates a tracker reporting finalizations to the given sink.
    #[must_use]
    pub fn with_event_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sessions: DashMap::new(),
            sink,
        }
    }

    /// Registers a session with its initial thread count.
    pub fn register_session(
        &self,
        session_id: impl Into<String>,
        chain_id: impl Into<String>,
        thread_count: i64,
    ) {
        let session_id = session_id.into();
        let entry = Arc::new(SessionEntry {
            chain_id: chain_id.into(),
            started_at: now_utc(),
            active_threads: AtomicI64::new(thread_count),
            thread_statuses: DashMap::new(),
        });

        if self.sessions.insert(session_id.clone(), entry).is_some() {
            tracing::warn!(session_id, "session registered twice, previous state dropped");
        }
    }

    /// Records a late-spawned thread (e.g. a nested split) on the session.
    pub fn on_thread_started(&self, session_id: &str) {
        match self.sessions.get(session_id) {
            Some(entry) => {
                entry.active_threads.fetch_add(1, Ordering::AcqRel);
            }
            None => {
                tracing::warn!(session_id, "thread started on an unregistered session");
            }
        }
    }

    /// Records one thread's outcome and elects the finisher.
    ///
    /// Returns `Some(FinalizedSession)` to exactly one caller per session:
    /// the thread whose decrement exhausts the counter. A session that was
    /// never registered is treated as having this sole thread and finalizes
    /// immediately.
    pub fn on_thread_finished(
        &self,
        session_id: &str,
        thread_id: &str,
        status: ExecutionStatus,
    ) -> Option<FinalizedSession> {
        let Some(entry) = self.sessions.get(session_id) else {
            tracing::debug!(
                session_id,
                thread_id,
                "unregistered session, treating caller as sole thread"
            );
            let finalized = FinalizedSession {
                session_id: session_id.to_string(),
                chain_id: None,
                status,
                duration_ms: 0,
            };
            self.report(&finalized);
            return Some(finalized);
        };

        entry
            .thread_statuses
            .insert(thread_id.to_string(), status);
        let remaining = entry.active_threads.fetch_sub(1, Ordering::AcqRel) - 1;
        drop(entry);

        if remaining > 0 {
            return None;
        }

        // Unique finisher: the counter reached zero on our decrement, so no
        // other thread can remove this entry.
        let (_, entry) = self.sessions.remove(session_id)?;
        let overall =
            ExecutionStatus::merge_all(entry.thread_statuses.iter().map(|kv| *kv.value()));
        let finalized = FinalizedSession {
            session_id: session_id.to_string(),
            chain_id: Some(entry.chain_id.clone()),
            status: overall,
            duration_ms: elapsed_ms(entry.started_at),
        };

        self.report(&finalized);
        Some(finalized)
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if the session is still live.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Reports a finalization; failures are logged, never propagated.
    fn report(&self, finalized: &FinalizedSession) {
        self.sink.try_emit(
            "session.finished",
            Some(serde_json::json!({
                "session_id": finalized.session_id,
                "chain_id": finalized.chain_id,
                "status": finalized.status.to_string(),
                "duration_ms": finalized.duration_ms,
            })),
        );
    }
}
