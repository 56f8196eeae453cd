//! Building and persisting checkpoint snapshots.

use super::ambient::{AmbientPropagator, NoopAmbientPropagator};
use super::model::Checkpoint;
use super::store::CheckpointStore;
use crate::codec::CodecRegistry;
use crate::context::ExecutionContext;
use crate::errors::CheckpointError;
use crate::utils::now_utc;
use std::sync::Arc;

/// Snapshots in-flight execution state into the checkpoint store.
///
/// The engine invokes [`CheckpointCapture::capture`] when execution passes
/// a checkpoint-marked element. Capture is all-or-nothing: any property
/// encoding error or store failure aborts the snapshot, so callers never
/// observe a partially persisted checkpoint.
pub struct CheckpointCapture {
    store: Arc<dyn CheckpointStore>,
    registry: Arc<CodecRegistry>,
    ambient: Arc<dyn AmbientPropagator>,
}

impl CheckpointCapture {
    /// Creates a capture service with no ambient propagation.
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

    /// Captures and persists a checkpoint of the given context.
    ///
    /// Internal control entries are excluded from the snapshot; remaining
    /// properties are encoded through the codec registry; the body is kept
    /// as raw bytes. The ambient snapshot is best-effort.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError` if property encoding or persistence fails;
    /// both abort capture entirely.
    pub async fn capture(
        &self,
        ctx: &ExecutionContext,
        session_id: &str,
        chain_id: &str,
        checkpoint_element_id: &str,
    ) -> Result<Checkpoint, CheckpointError> {
        let mut user_properties: Vec<(String, serde_json::Value)> =
            ctx.user_properties().into_iter().collect();
        user_properties.sort_by(|a, b| a.0.cmp(&b.0));

        let mut properties = Vec::with_capacity(user_properties.len());
        for (name, value) in &user_properties {
            properties.push(self.registry.encode_property(name, value)?);
        }

        let ambient_context = match self.ambient.capture() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(%error, "ambient context capture failed, snapshot proceeds without it");
                None
            }
        };

        let checkpoint = Checkpoint {
            session_id: session_id.to_string(),
            chain_id: chain_id.to_string(),
            checkpoint_element_id: checkpoint_element_id.to_string(),
            headers: ctx.user_headers(),
            body: ctx.body().map(<[u8]>::to_vec),
            properties,
            ambient_context,
            created_at: now_utc(),
        };

        self.store
            .save_and_assign_checkpoint(checkpoint.clone(), session_id)
            .await?;

        tracing::debug!(
            session_id,
            chain_id,
            checkpoint_element_id,
            property_count = checkpoint.properties.len(),
            "captured checkpoint"
        );

        Ok(checkpoint)
    }
}
