//! Rebuilding execution state from a checkpoint plus caller overrides.

use super::ambient::{AmbientPropagator, NoopAmbientPropagator};
use super::model::Checkpoint;
use super::store::CheckpointStore;
use crate::codec::CodecRegistry;
use crate::context::ExecutionContext;
use crate::errors::CheckpointError;
use crate::retry::RetryOverrides;
use std::sync::Arc;

/// The ancestry pair attached to a session created by retry.
///
/// `original_session_id` is the transitive root of the retry chain,
/// computed here once and stored flat on the new session so readers never
/// walk the parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAncestry {
    /// The session the retried checkpoint belongs to.
    pub parent_session_id: String,
    /// The root ancestor of the whole retry chain.
    pub original_session_id: String,
}

/// Execution state reconstructed from a checkpoint.
///
/// The engine resumes chain execution immediately after
/// `checkpoint_element_id`, attaching `ancestry` to the new session first.
#[derive(Debug, Clone)]
pub struct RestoredContext {
    /// The reconstructed execution context, overrides applied.
    pub context: ExecutionContext,
    /// Ancestry for the new session.
    pub ancestry: SessionAncestry,
    /// The element the checkpoint was taken at.
    pub checkpoint_element_id: String,
}

/// Rebuilds execution state from a stored checkpoint.
///
/// Restore never mutates the checkpoint; repeated retries of the same
/// checkpoint are independent.
pub struct CheckpointRestore {
    store: Arc<dyn CheckpointStore>,
    registry: Arc<CodecRegistry>,
    ambient: Arc<dyn AmbientPropagator>,
}

impl CheckpointRestore {
    /// Creates a restore service with no ambient propagation.
    #[must_use]
    pub fn new(store: Arc<dyn CheckpointStore>, registry: Arc<CodecRegistry>) -> Self {
        Self {
            store,
            registry,
            ambient: Arc::new(NoopAmbientPropagator),
        }
    }

    /// Sets the ambient context propagator.
    #[must_use]
    pub fn with_ambient(mut self, ambient: Arc<dyn AmbientPropagator>) -> Self {
        self.ambient = ambient;
        self
    }

    /// Restores execution state for a retry.
    ///
    /// Resolves the target checkpoint (a specific element, or the session's
    /// most recent), re-activates any captured ambient context, decodes the
    /// stored properties through the codec fallback chain, restores headers
    /// and body verbatim, applies the caller's overrides (override wins per
    /// key; the body is replaced wholesale), and computes the ancestry for
    /// the new session.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError::CheckpointNotFound` if no checkpoint
    /// matches, or a store error if the lookup itself fails.
    pub async fn restore(
        &self,
        chain_id: &str,
        session_id: &str,
        checkpoint_element_id: Option<&str>,
        overrides: &RetryOverrides,
    ) -> Result<RestoredContext, CheckpointError> {
        let checkpoint = self
            .store
            .find_checkpoint(session_id, chain_id, checkpoint_element_id)
            .await?
            .ok_or_else(|| {
                CheckpointError::not_found(session_id, chain_id, checkpoint_element_id)
            })?;

        if let Some(ref snapshot) = checkpoint.ambient_context {
            if let Err(error) = self.ambient.activate(snapshot) {
                tracing::warn!(%error, "ambient context activation failed, resuming without it");
            }
        }

        let mut context = ExecutionContext::new();
        for (name, value) in &checkpoint.headers {
            context.set_header(name.clone(), value.clone());
        }
        for stored in &checkpoint.properties {
            context.set_property(stored.name.clone(), self.registry.decode_property(stored));
        }
        context.set_body(checkpoint.body.clone());

        overrides.apply_to(&mut context);

        let ancestry = self.ancestry_for(&checkpoint).await?;

        tracing::debug!(
            chain_id,
            session_id,
            checkpoint_element_id = %checkpoint.checkpoint_element_id,
            parent_session_id = %ancestry.parent_session_id,
            original_session_id = %ancestry.original_session_id,
            "restored checkpoint"
        );

        Ok(RestoredContext {
            context,
            ancestry,
            checkpoint_element_id: checkpoint.checkpoint_element_id.clone(),
        })
    }

    /// Computes the new session's ancestry from the retried checkpoint.
    ///
    /// The parent is the checkpoint's own session. The original is the
    /// parent's recorded original if it has one (the parent was itself a
    /// retry), else the parent itself.
    async fn ancestry_for(&self, checkpoint: &Checkpoint) -> Result<SessionAncestry, CheckpointError> {
        let original_session_id = self
            .store
            .find_original_session_info(&checkpoint.session_id)
            .await?
            .and_then(|info| info.original_session_id)
            .unwrap_or_else(|| checkpoint.session_id.clone());

        Ok(SessionAncestry {
            parent_session_id: checkpoint.session_id.clone(),
            original_session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{CheckpointCapture, InMemoryCheckpointStore, SessionInfo};
    use crate::codec::{PropertyEncoding, StoredProperty};
    use crate::session::ExecutionStatus;
    use crate::utils::now_utc;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn services(store: Arc<InMemoryCheckpointStore>) -> (CheckpointCapture, CheckpointRestore) {
        let registry = Arc::new(CodecRegistry::new());
        (
            CheckpointCapture::new(store.clone(), registry.clone()),
            CheckpointRestore::new(store, registry),
        )
    }

    #[tokio::test]
    async fn test_round_trip_preserves_values_and_types() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (capture, restore) = services(store.clone());

        let mut ctx = ExecutionContext::new();
        ctx.set_property("count", serde_json::json!(5));
        ctx.set_property("tag", serde_json::json!("x"));
        ctx.set_header("origin", serde_json::json!("kafka"));
        ctx.set_body(Some(b"{\"a\":1}".to_vec()));

        let checkpoint = capture.capture(&ctx, "s-1", "c-1", "el-1").await.unwrap();
        let declared: HashMap<&str, &str> = checkpoint
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.declared_type.as_str()))
            .collect();
        assert_eq!(declared["count"], "integer");
        assert_eq!(declared["tag"], "string");

        let restored = restore
            .restore("c-1", "s-1", None, &RetryOverrides::default())
            .await
            .unwrap();

        assert_eq!(restored.context.property("count"), Some(&serde_json::json!(5)));
        assert_eq!(restored.context.property("tag"), Some(&serde_json::json!("x")));
        assert_eq!(restored.context.header("origin"), Some(&serde_json::json!("kafka")));
        assert_eq!(restored.context.body(), Some(b"{\"a\":1}".as_slice()));
        assert_eq!(restored.checkpoint_element_id, "el-1");
    }

    #[tokio::test]
    async fn test_overrides_win_over_restored_values() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (capture, restore) = services(store);

        let mut ctx = ExecutionContext::new();
        ctx.set_header("kept", serde_json::json!("restored"));
        ctx.set_header("replaced", serde_json::json!("restored"));
        ctx.set_body(Some(b"{\"a\":1}".to_vec()));
        capture.capture(&ctx, "s-1", "c-1", "el-1").await.unwrap();

        let overrides: RetryOverrides = serde_json::from_value(serde_json::json!({
            "headers": {"replaced": "override"},
            "body": {"a": 2},
        }))
        .unwrap();

        let restored = restore
            .restore("c-1", "s-1", None, &overrides)
            .await
            .unwrap();

        assert_eq!(restored.context.header("kept"), Some(&serde_json::json!("restored")));
        assert_eq!(restored.context.header("replaced"), Some(&serde_json::json!("override")));

        let body: serde_json::Value =
            serde_json::from_slice(restored.context.body().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_missing_checkpoint_is_fatal() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (_, restore) = services(store);

        let err = restore
            .restore("c-1", "ghost", Some("el-1"), &RetryOverrides::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckpointError::CheckpointNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ancestry_roots_at_the_first_session() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (capture, restore) = services(store.clone());

        // S1 was itself created by retrying S0.
        store.put_session(
            SessionInfo::new("s-1", "c-1", ExecutionStatus::Error)
                .with_parent_session_id("s-0")
                .with_original_session_id("s-0"),
        );
        capture
            .capture(&ExecutionContext::new(), "s-1", "c-1", "el-1")
            .await
            .unwrap();

        let restored = restore
            .restore("c-1", "s-1", None, &RetryOverrides::default())
            .await
            .unwrap();

        assert_eq!(restored.ancestry.parent_session_id, "s-1");
        assert_eq!(restored.ancestry.original_session_id, "s-0");
    }

    #[tokio::test]
    async fn test_ancestry_defaults_to_checkpoint_session() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (capture, restore) = services(store.clone());

        // No session record at all: the checkpoint's session is the root.
        capture
            .capture(&ExecutionContext::new(), "s-0", "c-1", "el-1")
            .await
            .unwrap();

        let restored = restore
            .restore("c-1", "s-0", None, &RetryOverrides::default())
            .await
            .unwrap();

        assert_eq!(restored.ancestry.parent_session_id, "s-0");
        assert_eq!(restored.ancestry.original_session_id, "s-0");
    }

    #[tokio::test]
    async fn test_legacy_property_restores_as_plain_string() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let (_, restore) = services(store.clone());

        // Hand-written checkpoint mimicking one persisted before the
        // current type metadata existed: the declared type resolves to no
        // codec and the bytes are not valid structured data.
        let checkpoint = Checkpoint {
            session_id: "s-1".to_string(),
            chain_id: "c-1".to_string(),
            checkpoint_element_id: "el-1".to_string(),
            headers: HashMap::new(),
            body: None,
            properties: vec![StoredProperty {
                name: "legacy".to_string(),
                declared_type: "com.example.Removed".to_string(),
                encoding: PropertyEncoding::Native,
                value: b"raw legacy bytes".to_vec(),
            }],
            ambient_context: None,
            created_at: now_utc(),
        };
        store
            .save_and_assign_checkpoint(checkpoint, "s-1")
            .await
            .unwrap();

        let restored = restore
            .restore("c-1", "s-1", None, &RetryOverrides::default())
            .await
            .unwrap();

        assert_eq!(
            restored.context.property("legacy"),
            Some(&serde_json::json!("raw legacy bytes"))
        );
    }

    #[tokio::test]
    async fn test_store_lookup_failure_propagates() {
        let mut store = crate::checkpoint::MockCheckpointStore::new();
        store
            .expect_find_checkpoint()
            .returning(|_, _, _| Err(crate::errors::StoreError::new("connection lost")));

        let restore =
            CheckpointRestore::new(Arc::new(store), Arc::new(CodecRegistry::new()));
        let err = restore
            .restore("c-1", "s-1", None, &RetryOverrides::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckpointError::Store(_)));
    }
}
