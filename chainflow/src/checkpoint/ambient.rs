//! Ambient context propagation collaborator.

use crate::errors::AmbientError;

/// Captures and re-activates ambient propagation/tracing state.
///
/// Implementations bridge to whatever distributed-tracing or context
/// propagation machinery the host runtime uses. Both operations are
/// best-effort at the call sites: an error here never blocks capture or
/// restore of the primary snapshot.
pub trait AmbientPropagator: Send + Sync {
    /// Snapshots the current ambient context, if one is active.
    ///
    /// # Errors
    ///
    /// Returns `AmbientError` if the snapshot cannot be taken; callers log
    /// and proceed without it.
    fn capture(&self) -> Result<Option<Vec<u8>>, AmbientError>;

    /// Re-activates a previously captured ambient context.
    ///
    /// # Errors
    ///
    /// Returns `AmbientError` if activation fails; callers log and resume
    /// without it.
    fn activate(&self, snapshot: &[u8]) -> Result<(), AmbientError>;
}

/// The default propagator: no ambient context is ever captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAmbientPropagator;

impl AmbientPropagator for NoopAmbientPropagator {
    fn capture(&self) -> Result<Option<Vec<u8>>, AmbientError> {
        Ok(None)
    }

    fn activate(&self, _snapshot: &[u8]) -> Result<(), AmbientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_propagator() {
        let propagator = NoopAmbientPropagator;
        assert_eq!(propagator.capture().unwrap(), None);
        assert!(propagator.activate(b"ignored").is_ok());
    }
}
