//! Accepting retry requests and resuming execution out of band.

use super::RetryOverrides;
use crate::checkpoint::{CheckpointRestore, CheckpointStore, RestoredContext, SessionInfo};
use crate::errors::{ChainflowError, CheckpointError, ResumeError, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// The execution engine boundary for resuming a restored session.
///
/// The engine creates the new session, attaches the ancestry carried by the
/// [`RestoredContext`], and resumes chain execution immediately after the
/// restored checkpoint element. It returns the new session's id so the
/// retry service can record the parent link.
#[async_trait]
pub trait ExecutionResumer: Send + Sync {
    /// Resumes execution of `chain_id` from the restored state.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError` if the engine cannot resume; the retry is
    /// logged as failed.
    async fn resume(
        &self,
        chain_id: &str,
        restored: RestoredContext,
    ) -> Result<String, ResumeError>;
}

/// Accepts retry requests and runs restore-and-resume off the caller's
/// thread.
///
/// Acceptance is synchronous and cheap: the target checkpoint must exist
/// (a missing one is surfaced to the caller as an explicit failure) and the
/// overrides must already be parsed. The restore itself, the engine resume,
/// and the ancestry bookkeeping happen on a spawned task, decoupling caller
/// latency from restore cost.
pub struct RetryService {
    store: Arc<dyn CheckpointStore>,
    restore: Arc<CheckpointRestore>,
    resumer: Arc<dyn ExecutionResumer>,
}

impl RetryService {
    /// Creates a retry service.
    #[must_use]
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        restore: CheckpointRestore,
        resumer: Arc<dyn ExecutionResumer>,
    ) -> Self {
        Self {
            store,
            restore: Arc::new(restore),
            resumer,
        }
    }

    /// Accepts a retry for a session, targeting a specific checkpoint
    /// element or the session's most recent checkpoint.
    ///
    /// Returns as soon as the retry is validated and scheduled; the actual
    /// restore-and-resume runs out of band.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError::CheckpointNotFound` if the session has no
    /// matching checkpoint, or a store error if the lookup fails.
    pub async fn submit_retry(
        &self,
        chain_id: &str,
        session_id: &str,
        checkpoint_element_id: Option<&str>,
        overrides: RetryOverrides,
    ) -> Result<(), CheckpointError> {
        let found = self
            .store
            .find_checkpoint(session_id, chain_id, checkpoint_element_id)
            .await?;
        if found.is_none() {
            return Err(CheckpointError::not_found(
                session_id,
                chain_id,
                checkpoint_element_id,
            ));
        }

        let store = Arc::clone(&self.store);
        let restore = Arc::clone(&self.restore);
        let resumer = Arc::clone(&self.resumer);
        let chain_id = chain_id.to_string();
        let session_id = session_id.to_string();
        let checkpoint_element_id = checkpoint_element_id.map(String::from);

        tokio::spawn(async move {
            let outcome = restore_and_resume(
                &store,
                &restore,
                &resumer,
                &chain_id,
                &session_id,
                checkpoint_element_id.as_deref(),
                &overrides,
            )
            .await;

            if let Err(error) = outcome {
                tracing::error!(%chain_id, %session_id, %error, "retry failed");
            }
        });

        Ok(())
    }

    /// Lists failed sessions of a chain that can be retried.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store lookup fails.
    pub async fn list_failed_sessions(
        &self,
        chain_id: &str,
    ) -> Result<Vec<SessionInfo>, StoreError> {
        self.store.list_failed_sessions_with_checkpoints(chain_id).await
    }

    /// Lists session records by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store lookup fails.
    pub async fn list_sessions(&self, ids: &[String]) -> Result<Vec<SessionInfo>, StoreError> {
        self.store.list_sessions(ids).await
    }
}

/// Runs one accepted retry to completion: restore, resume, parent link.
async fn restore_and_resume(
    store: &Arc<dyn CheckpointStore>,
    restore: &CheckpointRestore,
    resumer: &Arc<dyn ExecutionResumer>,
    chain_id: &str,
    session_id: &str,
    checkpoint_element_id: Option<&str>,
    overrides: &RetryOverrides,
) -> Result<(), ChainflowError> {
    let restored = restore
        .restore(chain_id, session_id, checkpoint_element_id, overrides)
        .await?;
    let ancestry = restored.ancestry.clone();

    let new_session_id = resumer.resume(chain_id, restored).await?;
    store
        .update_session_parent(&new_session_id, &ancestry.parent_session_id)
        .await?;

    tracing::info!(
        chain_id,
        %new_session_id,
        parent_session_id = %ancestry.parent_session_id,
        original_session_id = %ancestry.original_session_id,
        "retry resumed"
    );
    Ok(())
}
