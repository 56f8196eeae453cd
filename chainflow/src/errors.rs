//! Error types for the chainflow runtime core.
//!
//! Every fallible boundary (property codec, checkpoint store, restore path,
//! retry request parsing, engine resume) has its own error type; the
//! [`ChainflowError`] umbrella exists for callers that want a single
//! `Result` type across the crate.

use thiserror::Error;

/// The main error type for chainflow operations.
#[derive(Debug, Error)]
pub enum ChainflowError {
    /// A checkpoint capture or restore error occurred.
    #[error("{0}")]
    Checkpoint(#[from] CheckpointError),

    /// A property encoding/decoding error occurred.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// The checkpoint store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A retry request carried unparsable overrides.
    #[error("{0}")]
    OverrideParse(#[from] OverrideParseError),

    /// The execution engine failed to resume a restored session.
    #[error("{0}")]
    Resume(#[from] ResumeError),

    /// Ambient context propagation failed.
    #[error("{0}")]
    Ambient(#[from] AmbientError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while encoding or decoding checkpoint property values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A registered native codec failed to encode a value it claimed.
    #[error("native encoding failed for type '{type_name}': {reason}")]
    NativeEncode {
        /// The codec's declared type name.
        type_name: String,
        /// Why the encode failed.
        reason: String,
    },

    /// A registered native codec failed to decode stored bytes.
    #[error("native decoding failed for type '{type_name}': {reason}")]
    NativeDecode {
        /// The codec's declared type name.
        type_name: String,
        /// Why the decode failed.
        reason: String,
    },

    /// Structured (JSON) encoding or decoding failed.
    #[error("structured encoding failed: {0}")]
    Structured(#[from] serde_json::Error),
}

impl CodecError {
    /// Creates a native encode error.
    #[must_use]
    pub fn native_encode(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NativeEncode {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a native decode error.
    #[must_use]
    pub fn native_decode(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NativeDecode {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised by checkpoint store implementations.
///
/// Store internals (SQL schema, pooling) live behind the
/// [`CheckpointStore`](crate::checkpoint::CheckpointStore) trait; this type
/// is the only error shape that crosses the boundary.
#[derive(Debug, Clone, Error)]
#[error("checkpoint store error: {message}")]
pub struct StoreError {
    /// Description of the backend failure.
    pub message: String,
}

impl StoreError {
    /// Creates a new store error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised on the checkpoint capture and restore paths.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint matched the requested session/chain/element triple.
    ///
    /// Fatal to the retry/restore path; surfaced to the caller rather than
    /// silently ignored.
    #[error(
        "checkpoint not found for session '{session_id}' of chain '{chain_id}'{}",
        .checkpoint_element_id
            .as_deref()
            .map(|e| format!(" at element '{e}'"))
            .unwrap_or_default()
    )]
    CheckpointNotFound {
        /// The session the retry targeted.
        session_id: String,
        /// The chain the retry targeted.
        chain_id: String,
        /// The specific checkpoint element, if one was requested.
        checkpoint_element_id: Option<String>,
    },

    /// A session referenced by the request does not exist.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The missing session id.
        session_id: String,
    },

    /// The checkpoint store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Property encoding failed during capture.
    ///
    /// Capture has no partial-failure mode: any encoding error aborts the
    /// whole snapshot.
    #[error("{0}")]
    Codec(#[from] CodecError),
}

impl CheckpointError {
    /// Creates a checkpoint-not-found error.
    #[must_use]
    pub fn not_found(
        session_id: impl Into<String>,
        chain_id: impl Into<String>,
        checkpoint_element_id: Option<&str>,
    ) -> Self {
        Self::CheckpointNotFound {
            session_id: session_id.into(),
            chain_id: chain_id.into(),
            checkpoint_element_id: checkpoint_element_id.map(String::from),
        }
    }
}

/// Error raised when a retry request body or headers cannot be parsed.
///
/// Fatal to that retry request; raised before any state mutation.
#[derive(Debug, Clone, Error)]
#[error("malformed retry overrides: {reason}")]
pub struct OverrideParseError {
    /// Why parsing failed.
    pub reason: String,
}

impl OverrideParseError {
    /// Creates a new override parse error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error raised by the execution engine when resuming a restored session.
#[derive(Debug, Clone, Error)]
#[error("execution resume failed: {reason}")]
pub struct ResumeError {
    /// Why the resume failed.
    pub reason: String,
}

impl ResumeError {
    /// Creates a new resume error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error raised by the ambient context propagation collaborator.
///
/// Ambient capture and activation are best-effort; callers log these and
/// continue with the primary snapshot.
#[derive(Debug, Clone, Error)]
#[error("ambient context error: {reason}")]
pub struct AmbientError {
    /// Why the ambient operation failed.
    pub reason: String,
}

impl AmbientError {
    /// Creates a new ambient context error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
