//! Axum router for the retry control surface.

use super::handlers;
use crate::retry::RetryService;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the control-surface router.
///
/// The router owns no execution state beyond the shared [`RetryService`];
/// embedders mount it into their server or serve it standalone.
pub fn build_router(service: Arc<RetryService>) -> Router {
    Router::new()
        .route(
            "/chains/{chain_id}/sessions/{session_id}/retry",
            post(handlers::retry_session),
        )
        .route(
            "/chains/{chain_id}/sessions/{session_id}/checkpoint-elements/{checkpoint_element_id}/retry",
            post(handlers::retry_session_from_element),
        )
        .route(
            "/chains/{chain_id}/sessions/failed",
            get(handlers::list_failed_sessions),
        )
        .route("/sessions", get(handlers::list_sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
