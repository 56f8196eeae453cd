//! # Chainflow
//!
//! The execution-tracking and recovery core of an integration-chain
//! runtime. Chainflow tracks concurrently running branches of a logical
//! session, merges their results back together with selective data
//! propagation, combines per-thread outcomes into one overall status, and
//! persists point-in-time checkpoints so a failed session can be resumed
//! from a safe point instead of from scratch.
//!
//! The host execution engine owns scheduling, transports, and the chain
//! graph; it drives this crate at four lifecycle points:
//!
//! - **Branch aggregation**: [`aggregate::BranchAggregator`] folds each
//!   completed split branch into the running accumulator
//! - **Session tracking**: [`session::SessionTracker`] records per-thread
//!   outcomes and elects the unique finishing thread
//! - **Checkpoint capture**: [`checkpoint::CheckpointCapture`] snapshots
//!   in-flight state when execution passes a checkpoint-marked element
//! - **Checkpoint restore**: [`checkpoint::CheckpointRestore`] rebuilds
//!   state for a retry, merging caller overrides and re-establishing
//!   session ancestry
//!
//! The retry control surface in [`http`] accepts retry requests and runs
//! restore-and-resume out of band.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chainflow::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryCheckpointStore::new());
//! let registry = Arc::new(CodecRegistry::new());
//!
//! // Snapshot state at a checkpoint-marked element.
//! let capture = CheckpointCapture::new(store.clone(), registry.clone());
//! capture.capture(&ctx, "session-1", "chain-1", "element-7").await?;
//!
//! // Later, retry the failed session from that snapshot.
//! let restore = CheckpointRestore::new(store.clone(), registry);
//! let service = Arc::new(RetryService::new(store, restore, resumer));
//! let router = build_router(service);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod aggregate;
pub mod checkpoint;
pub mod codec;
pub mod context;
pub mod errors;
pub mod events;
pub mod http;
pub mod retry;
pub mod session;
pub mod testing;
pub mod utils;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::aggregate::{BranchAggregator, BranchResult};
    pub use crate::checkpoint::{
        AmbientPropagator, Checkpoint, CheckpointCapture, CheckpointRestore, CheckpointStore,
        InMemoryCheckpointStore, NoopAmbientPropagator, RestoredContext, SessionAncestry,
        SessionInfo,
    };
    pub use crate::codec::{CodecRegistry, NativeCodec, PropertyEncoding, StoredProperty};
    pub use crate::context::{BranchSettings, ExecutionContext};
    pub use crate::errors::{
        AmbientError, ChainflowError, CheckpointError, CodecError, OverrideParseError,
        ResumeError, StoreError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::http::{build_router, ApiError};
    pub use crate::retry::{ExecutionResumer, RetryOverrides, RetryService};
    pub use crate::session::{ExecutionStatus, FinalizedSession, SessionTracker};
    pub use crate::utils::{generate_id, generate_uuid, iso_timestamp, Timestamp};
}
