//! Retry and session lookup handlers.

use super::error::ApiError;
use crate::checkpoint::SessionInfo;
use crate::retry::{RetryOverrides, RetryService};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

/// Request header that forces tracing of the retried session.
pub const FORCE_TRACE_HEADER: &str = "x-force-trace";

/// Header set on the restored context when tracing is forced; the engine's
/// tracing layer reads it.
pub const TRACE_ME_HEADER: &str = "trace_me";

/// Query parameters for listing sessions by id.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Comma-separated session ids.
    pub ids: String,
}

/// POST /chains/{chain_id}/sessions/{session_id}/retry
///
/// Retries the session from its most recent checkpoint. Fire-and-forget:
/// a valid request is answered with `202 Accepted` before the restore runs.
pub async fn retry_session(
    State(service): State<Arc<RetryService>>,
    Path((chain_id, session_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let overrides = overrides_from_request(&headers, &body)?;
    service
        .submit_retry(&chain_id, &session_id, None, overrides)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /chains/{chain_id}/sessions/{session_id}/checkpoint-elements/{checkpoint_element_id}/retry
///
/// Same contract as [`retry_session`], targeting a specific checkpoint.
pub async fn retry_session_from_element(
    State(service): State<Arc<RetryService>>,
    Path((chain_id, session_id, checkpoint_element_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let overrides = overrides_from_request(&headers, &body)?;
    service
        .submit_retry(&chain_id, &session_id, Some(&checkpoint_element_id), overrides)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /chains/{chain_id}/sessions/failed
///
/// Lists failed sessions of the chain that have at least one usable
/// checkpoint.
pub async fn list_failed_sessions(
    State(service): State<Arc<RetryService>>,
    Path(chain_id): Path<String>,
) -> Result<Json<Vec<SessionInfo>>, ApiError> {
    let sessions = service.list_failed_sessions(&chain_id).await?;
    Ok(Json(sessions))
}

/// GET /sessions?ids=a,b,c
///
/// Lists session records by id; unknown ids are omitted.
pub async fn list_sessions(
    State(service): State<Arc<RetryService>>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<SessionInfo>>, ApiError> {
    let ids: Vec<String> = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();

    let sessions = service.list_sessions(&ids).await?;
    Ok(Json(sessions))
}

/// Builds the overrides for a retry request.
///
/// The JSON body carries the replacement payload; an `Authorization` header
/// replaces the restored authorization, and [`FORCE_TRACE_HEADER`] forces
/// tracing of the new session. Unparsable input aborts the request before
/// any state mutation.
fn overrides_from_request(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RetryOverrides, ApiError> {
    let mut overrides = RetryOverrides::parse(body)?;

    if let Some(authorization) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = authorization
            .to_str()
            .map_err(|_| ApiError::BadRequest("non-ascii authorization header".to_string()))?;
        overrides.set_header("Authorization", serde_json::json!(value));
    }

    if let Some(force_trace) = headers.get(FORCE_TRACE_HEADER) {
        let forced = force_trace
            .to_str()
            .map_or(false, |v| v.eq_ignore_ascii_case("true"));
        if forced {
            overrides.set_header(TRACE_ME_HEADER, serde_json::json!(true));
        }
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overrides_pick_up_authorization_and_trace_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer token".parse().unwrap(),
        );
        headers.insert(FORCE_TRACE_HEADER, "true".parse().unwrap());

        let overrides =
            overrides_from_request(&headers, &Bytes::from_static(b"{\"body\": \"x\"}")).unwrap();

        let header_map = overrides.headers.as_ref().unwrap();
        assert_eq!(header_map["Authorization"], serde_json::json!("Bearer token"));
        assert_eq!(header_map[TRACE_ME_HEADER], serde_json::json!(true));
        assert_eq!(overrides.body_bytes(), Some(b"x".to_vec()));
    }

    #[test]
    fn test_trace_header_must_be_true() {
        let mut headers = HeaderMap::new();
        headers.insert(FORCE_TRACE_HEADER, "yes please".parse().unwrap());

        let overrides = overrides_from_request(&headers, &Bytes::new()).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let headers = HeaderMap::new();
        let result = overrides_from_request(&headers, &Bytes::from_static(b"{broken"));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
