//! The checkpoint persistence boundary.

use super::model::{Checkpoint, SessionInfo};
use crate::errors::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Persistence operations consumed by the checkpoint core.
///
/// Implementations own schema, pooling, and retention; this trait is the
/// whole surface the core sees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Finds a checkpoint by session and chain.
    ///
    /// With an element id, the match is exact; without one, the session's
    /// most recent checkpoint wins.
    async fn find_checkpoint<'a>(
        &self,
        session_id: &str,
        chain_id: &str,
        checkpoint_element_id: Option<&'a str>,
    ) -> Result<Option<Checkpoint>, StoreError>;

    /// Persists a checkpoint and associates it with the session.
    async fn save_and_assign_checkpoint(
        &self,
        checkpoint: Checkpoint,
        session_id: &str,
    ) -> Result<(), StoreError>;

    /// Resolves the session record used for ancestry-root lookups.
    async fn find_original_session_info(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionInfo>, StoreError>;

    /// Records the parent of a retried session.
    async fn update_session_parent(
        &self,
        session_id: &str,
        parent_session_id: &str,
    ) -> Result<(), StoreError>;

    /// Lists failed sessions of a chain that have at least one usable
    /// checkpoint.
    async fn list_failed_sessions_with_checkpoints(
        &self,
        chain_id: &str,
    ) -> Result<Vec<SessionInfo>, StoreError>;

    /// Lists session records by id; unknown ids are omitted.
    async fn list_sessions(&self, ids: &[String]) -> Result<Vec<SessionInfo>, StoreError>;
}

/// An in-memory checkpoint store.
///
/// Suitable for tests and single-process embedding; insertion order stands
/// in for recency when resolving "most recent checkpoint".
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: RwLock<Vec<Checkpoint>>,
    sessions: RwLock<HashMap<String, SessionInfo>>,
}

impl InMemoryCheckpointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a session record.
    ///
    /// The engine owns session records; this inherent method is how an
    /// embedding (or a test) mirrors them into the store.
    pub fn put_session(&self, info: SessionInfo) {
        self.sessions.write().insert(info.session_id.clone(), info);
    }

    /// Returns the number of stored checkpoints.
    #[must_use]
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.read().len()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn find_checkpoint<'a>(
        &self,
        session_id: &str,
        chain_id: &str,
        checkpoint_element_id: Option<&'a str>,
    ) -> Result<Option<Checkpoint>, StoreError> {
        let checkpoints = self.checkpoints.read();
        let found = checkpoints
            .iter()
            .rev()
            .find(|cp| {
                cp.session_id == session_id
                    && cp.chain_id == chain_id
                    && checkpoint_element_id
                        .map_or(true, |element| cp.checkpoint_element_id == element)
            })
            .cloned();
        Ok(found)
    }

    async fn save_and_assign_checkpoint(
        &self,
        checkpoint: Checkpoint,
        session_id: &str,
    ) -> Result<(), StoreError> {
        if checkpoint.session_id != session_id {
            return Err(StoreError::new(format!(
                "checkpoint session '{}' does not match assignment '{session_id}'",
                checkpoint.session_id
            )));
        }
        self.checkpoints.write().push(checkpoint);
        Ok(())
    }

    async fn find_original_session_info(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionInfo>, StoreError> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn update_session_parent(
        &self,
        session_id: &str,
        parent_session_id: &str,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(session_id) {
            Some(info) => {
                info.parent_session_id = Some(parent_session_id.to_string());
                Ok(())
            }
            None => Err(StoreError::new(format!(
                "cannot set parent of unknown session '{session_id}'"
            ))),
        }
    }

    async fn list_failed_sessions_with_checkpoints(
        &self,
        chain_id: &str,
    ) -> Result<Vec<SessionInfo>, StoreError> {
        let checkpoints = self.checkpoints.read();
        let mut failed: Vec<SessionInfo> = self
            .sessions
            .read()
            .values()
            .filter(|info| info.chain_id == chain_id && info.status.is_error())
            .filter(|info| {
                checkpoints
                    .iter()
                    .any(|cp| cp.session_id == info.session_id && cp.chain_id == chain_id)
            })
            .cloned()
            .collect();
        failed.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(failed)
    }

    async fn list_sessions(&self, ids: &[String]) -> Result<Vec<SessionInfo>, StoreError> {
        let sessions = self.sessions.read();
        Ok(ids
            .iter()
            .filter_map(|id| sessions.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ExecutionStatus;
    use crate::utils::now_utc;
    use pretty_assertions::assert_eq;
    use tokio_test::assert_ok;

    fn checkpoint(session_id: &str, chain_id: &str, element: &str) -> Checkpoint {
        Checkpoint {
            session_id: session_id.to_string(),
            chain_id: chain_id.to_string(),
            checkpoint_element_id: element.to_string(),
            headers: HashMap::new(),
            body: None,
            properties: Vec::new(),
            ambient_context: None,
            created_at: now_utc(),
        }
    }

    #[tokio::test]
    async fn test_find_checkpoint_by_element() {
        let store = InMemoryCheckpointStore::new();
        tokio_test::assert_ok!(
            store
                .save_and_assign_checkpoint(checkpoint("s-1", "c-1", "el-1"), "s-1")
                .await
        );
        tokio_test::assert_ok!(
            store
                .save_and_assign_checkpoint(checkpoint("s-1", "c-1", "el-2"), "s-1")
                .await
        );

        let found = store
            .find_checkpoint("s-1", "c-1", Some("el-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.checkpoint_element_id, "el-1");
    }

    #[tokio::test]
    async fn test_find_checkpoint_without_element_returns_most_recent() {
        let store = InMemoryCheckpointStore::new();
        store
            .save_and_assign_checkpoint(checkpoint("s-1", "c-1", "el-1"), "s-1")
            .await
            .unwrap();
        store
            .save_and_assign_checkpoint(checkpoint("s-1", "c-1", "el-2"), "s-1")
            .await
            .unwrap();

        let found = store
            .find_checkpoint("s-1", "c-1", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.checkpoint_element_id, "el-2");
    }

    #[tokio::test]
    async fn test_save_rejects_mismatched_assignment() {
        let store = InMemoryCheckpointStore::new();
        let result = store
            .save_and_assign_checkpoint(checkpoint("s-1", "c-1", "el-1"), "s-other")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_failed_sessions_requires_a_checkpoint() {
        let store = InMemoryCheckpointStore::new();
        store.put_session(SessionInfo::new("s-ok", "c-1", ExecutionStatus::Normal));
        store.put_session(SessionInfo::new("s-bare", "c-1", ExecutionStatus::Error));
        store.put_session(SessionInfo::new("s-usable", "c-1", ExecutionStatus::Error));
        store
            .save_and_assign_checkpoint(checkpoint("s-usable", "c-1", "el-1"), "s-usable")
            .await
            .unwrap();

        let failed = store
            .list_failed_sessions_with_checkpoints("c-1")
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].session_id, "s-usable");
    }

    #[tokio::test]
    async fn test_update_session_parent() {
        let store = InMemoryCheckpointStore::new();
        store.put_session(SessionInfo::new("s-2", "c-1", ExecutionStatus::Normal));

        store.update_session_parent("s-2", "s-1").await.unwrap();

        let sessions = store.list_sessions(&["s-2".to_string()]).await.unwrap();
        assert_eq!(sessions[0].parent_session_id.as_deref(), Some("s-1"));

        let missing = store.update_session_parent("ghost", "s-1").await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_list_sessions_omits_unknown_ids() {
        let store = InMemoryCheckpointStore::new();
        store.put_session(SessionInfo::new("s-1", "c-1", ExecutionStatus::Normal));

        let sessions = store
            .list_sessions(&["s-1".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
    }
}
