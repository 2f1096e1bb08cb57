//! Service banner and health endpoint handlers.
//!
//! All of these routes are unauthenticated: the auth gate bypasses
//! everything except the ingestion route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// `GET /` — service banner.
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "agentgate",
        "message": "AgentGate agent server is running",
        "health": "/health",
    }))
}

/// `GET /health` — liveness payload for monitoring.
///
/// Always 200 with a fixed healthy-status body, regardless of any
/// `Authorization` header on the request.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "agentgate-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Kubernetes liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe -- returns 200 when ready, 503 otherwise.
///
/// 503 is returned during startup and while draining, which removes the
/// instance from load-balancer rotation without restarting it.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
