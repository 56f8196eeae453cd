//! The retry control surface.
//!
//! A small axum router exposing session retry and lookup endpoints:
//!
//! - `POST /chains/{chain_id}/sessions/{session_id}/retry`
//! - `POST /chains/{chain_id}/sessions/{session_id}/checkpoint-elements/{checkpoint_element_id}/retry`
//! - `GET  /chains/{chain_id}/sessions/failed`
//! - `GET  /sessions?ids=a,b,c`
//!
//! Retries are fire-and-forget: the handler validates the request, answers
//! `202 Accepted`, and the actual restore-and-resume runs on a different
//! task than the accepting thread.

mod error;
mod handlers;
mod router;

pub use error::ApiError;
pub use handlers::{FORCE_TRACE_HEADER, TRACE_ME_HEADER};
pub use router::build_router;
