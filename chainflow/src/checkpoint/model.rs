//! Persistable checkpoint and session records.

use crate::codec::{base64_opt, StoredProperty};
use crate::session::ExecutionStatus;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A durable, point-in-time snapshot of execution state.
///
/// Addressable by session + chain + checkpoint element id. Created by
/// [`CheckpointCapture`](super::CheckpointCapture), read (never mutated) by
/// [`CheckpointRestore`](super::CheckpointRestore); retention is the
/// store's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The session the snapshot belongs to.
    pub session_id: String,
    /// The chain (workflow) identifier.
    pub chain_id: String,
    /// Identifies where in the chain the snapshot was taken.
    pub checkpoint_element_id: String,
    /// Headers at capture time, internal entries excluded.
    pub headers: HashMap<String, serde_json::Value>,
    /// Raw body payload, if any.
    #[serde(with = "base64_opt", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    /// Encoded properties in stable name order.
    pub properties: Vec<StoredProperty>,
    /// Opaque propagation/tracing snapshot, if one was available.
    #[serde(with = "base64_opt", default, skip_serializing_if = "Option::is_none")]
    pub ambient_context: Option<Vec<u8>>,
    /// When the snapshot was taken.
    pub created_at: Timestamp,
}

/// A session record as the checkpoint store knows it.
///
/// `original_session_id` is always the transitive root of the parent chain:
/// it is computed once, at retry time, and stored flat, never recomputed
/// by walking parents at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// The session id.
    pub session_id: String,
    /// The chain the session executed.
    pub chain_id: String,
    /// The session's overall status.
    pub status: ExecutionStatus,
    /// When the session started.
    pub started_at: Timestamp,
    /// The session this one was retried from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,
    /// The root ancestor of the retry chain; equals the session's own id
    /// semantics when the session is not a retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_session_id: Option<String>,
}

impl SessionInfo {
    /// Creates a session record with no ancestry.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        chain_id: impl Into<String>,
        status: ExecutionStatus,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            chain_id: chain_id.into(),
            status,
            started_at: crate::utils::now_utc(),
            parent_session_id: None,
            original_session_id: None,
        }
    }

    /// Sets the parent session id.
    #[must_use]
    pub fn with_parent_session_id(mut self, parent: impl Into<String>) -> Self {
        self.parent_session_id = Some(parent.into());
        self
    }

    /// Sets the original (root ancestor) session id.
    #[must_use]
    pub fn with_original_session_id(mut self, original: impl Into<String>) -> Self {
        self.original_session_id = Some(original.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PropertyEncoding;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checkpoint_serialization_round_trip() {
        let checkpoint = Checkpoint {
            session_id: "s-1".to_string(),
            chain_id: "c-1".to_string(),
            checkpoint_element_id: "el-1".to_string(),
            headers: HashMap::from([("a".to_string(), serde_json::json!("1"))]),
            body: Some(b"{\"a\":1}".to_vec()),
            properties: vec![StoredProperty {
                name: "count".to_string(),
                declared_type: "integer".to_string(),
                encoding: PropertyEncoding::Structured,
                value: b"5".to_vec(),
            }],
            ambient_context: None,
            created_at: crate::utils::now_utc(),
        };

        let json = serde_json::to_string(&checkpoint).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }

    #[test]
    fn test_session_info_builder() {
        let info = SessionInfo::new("s-2", "c-1", ExecutionStatus::Error)
            .with_parent_session_id("s-1")
            .with_original_session_id("s-0");

        assert_eq!(info.parent_session_id.as_deref(), Some("s-1"));
        assert_eq!(info.original_session_id.as_deref(), Some("s-0"));
        assert!(info.status.is_error());
    }
}
