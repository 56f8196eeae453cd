//! Session completion tracking.
//!
//! This module provides:
//! - The ordered [`ExecutionStatus`] outcome lattice with its max-merge
//! - The [`SessionTracker`] that combines per-thread outcomes into one
//!   overall session status and elects the unique finishing thread

mod status;
mod tracker;

pub use status::ExecutionStatus;
pub use tracker::{FinalizedSession, SessionTracker};
