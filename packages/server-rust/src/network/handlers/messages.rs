//! Message-ingestion endpoint handler.
//!
//! The auth gate has already run by the time this handler executes: a
//! rejected request never reaches it. The handler validates the body,
//! builds the adapted request, invokes the activity processor exactly once,
//! and translates the result.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use agentgate_core::{ClaimsIdentity, RequestLike};

use super::AppState;
use crate::network::adapter;

/// Handles `POST /api/messages`.
pub async fn messages_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    identity: Option<Extension<ClaimsIdentity>>,
    body: Bytes,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();

    if body.is_empty() {
        warn!("request body is empty");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Request body is empty" })),
        )
            .into_response();
    }
    debug!(body_len = body.len(), "processing inbound activity");

    let identity = identity.map(|Extension(identity)| identity);
    let request = adapter::adapt_request(method, headers, body, identity, &state.connections);

    // Undecodable payloads are a client error; the processor never runs.
    if let Err(err) = request.json() {
        warn!(%err, "request body is not valid JSON");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": format!("Invalid JSON: {err}") })),
        )
            .into_response();
    }

    match state.processor.process(&request).await {
        Ok(processed) => adapter::translate_processed(processed),
        Err(err) => adapter::internal_error(&err),
    }
}
