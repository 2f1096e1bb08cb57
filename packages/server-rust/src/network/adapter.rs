//! Request shape adapter.
//!
//! Reshapes the axum-native request into the [`AdaptedRequest`] the activity
//! pipeline consumes, and translates the pipeline's [`ProcessedActivity`]
//! (or fault) back into an axum response. The body is read once by the
//! handler; everything here works from that single buffer.

use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{json, Value};
use tracing::{error, warn};

use agentgate_core::{AdaptedRequest, ClaimsIdentity, ConnectionSettings, ProcessedActivity};

/// Builds the adapted request handed to the activity processor.
///
/// Attaches the identity resolved by the auth gate and injects the agent
/// configuration into the request data bag. A missing identity is logged
/// but does not fail the request: anonymous identities are valid, and the
/// processor decides what unauthenticated traffic may do.
#[must_use]
pub fn adapt_request(
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    identity: Option<ClaimsIdentity>,
    connections: &ConnectionSettings,
) -> AdaptedRequest {
    let mut request = AdaptedRequest::new(method, headers, body);

    match identity {
        Some(identity) => request.set_identity(identity),
        None => warn!("no claims identity attached to request; continuing without one"),
    }

    request.insert_value(
        "agent_configuration",
        serde_json::to_value(connections).unwrap_or(Value::Null),
    );

    request
}

/// Translates a processed-activity result into the native response.
///
/// A carried body is JSON-decoded and echoed with the processor's status
/// code; no body means a generic `{"status": "ok"}` with 200.
#[must_use]
pub fn translate_processed(processed: ProcessedActivity) -> Response {
    match processed.body {
        Some(body) if !body.is_empty() => match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => {
                let status = StatusCode::from_u16(processed.status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(payload)).into_response()
            }
            Err(err) => {
                error!(%err, "processor returned a non-JSON body");
                internal_error(&err.into())
            }
        },
        _ => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
    }
}

/// The 500 shape for downstream processing faults.
///
/// The only path in this subsystem that produces a 500. The message is the
/// fault's display form; no stack material ever reaches the caller.
#[must_use]
pub fn internal_error(err: &anyhow::Error) -> Response {
    error!(%err, "activity processing failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": format!("Internal server error: {err}") })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgate_core::RequestLike;
    use http_body_util::BodyExt;

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn adapt_attaches_identity_and_configuration() {
        let connections = ConnectionSettings {
            graph: Some("GRAPH".to_string()),
            github: None,
        };
        let request = adapt_request(
            Method::POST,
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
            Some(ClaimsIdentity::anonymous()),
            &connections,
        );

        assert!(request.identity().is_some());
        assert_eq!(
            request.value("agent_configuration"),
            Some(&json!({"graph": "GRAPH", "github": null}))
        );
    }

    #[test]
    fn adapt_tolerates_missing_identity() {
        let request = adapt_request(
            Method::POST,
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
            None,
            &ConnectionSettings::default(),
        );
        assert!(request.identity().is_none());
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn no_body_translates_to_generic_ok() {
        let (status, body) = response_json(translate_processed(ProcessedActivity::ok())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn carried_body_echoes_processor_status() {
        let processed = ProcessedActivity::with_json(201, &json!({"id": "act-1"}));
        let (status, body) = response_json(translate_processed(processed)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": "act-1"}));
    }

    #[tokio::test]
    async fn non_json_processor_body_is_a_processing_fault() {
        let processed = ProcessedActivity {
            status: 200,
            body: Some(Bytes::from_static(b"not json")),
        };
        let (status, body) = response_json(translate_processed(processed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Internal server error:"));
    }

    #[tokio::test]
    async fn fault_translates_to_500_with_message() {
        let err = anyhow::anyhow!("boom");
        let (status, body) = response_json(internal_error(&err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "Internal server error: boom"}));
    }
}
