//! Bearer auth gate for the message-ingestion route.
//!
//! Every request to `POST /api/messages` passes through the gate: the
//! `Authorization` header is parsed, the token is handed to the configured
//! [`TokenValidator`], and the resolved [`ClaimsIdentity`] is attached to
//! the request's extensions. All other routes bypass the gate
//! unconditionally.
//!
//! Tokens and decoded claims never appear in logs at default verbosity.
//! Debug level logs a truncated preview only. The `log_tokens` opt-in
//! (local debugging only) logs full tokens at warn level and announces
//! itself once at startup.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use serde_json::json;
use tracing::{debug, error, warn};

use agentgate_core::{AuthConfig, ClaimsIdentity, TokenValidator, ValidationError};

use super::handlers::AppState;

/// The single route the gate protects.
pub const MESSAGES_PATH: &str = "/api/messages";

/// A 401 rejection produced by the gate.
///
/// Authentication failures are always 401 with an `{"error": ...}` body --
/// validator faults included, never a 500.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthRejection {
    message: String,
}

impl AuthRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message carried in the response body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Validates inbound bearer tokens against the configured trust parameters.
pub struct AuthGate {
    config: Arc<AuthConfig>,
    validator: Arc<dyn TokenValidator>,
}

impl AuthGate {
    /// Creates the gate. Emits a one-time startup warning when full-token
    /// logging is enabled.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, validator: Arc<dyn TokenValidator>) -> Self {
        if config.log_tokens {
            warn!("bearer token logging is ENABLED; tokens will appear in logs in plaintext");
            warn!("this mode is for local debugging only; unset LOG_JWT_TOKENS to disable it");
        }
        Self { config, validator }
    }

    /// Authenticates one request to the ingestion route.
    ///
    /// Resolution order: missing header (anonymous or 401 depending on
    /// configuration), malformed header shape (401), then validator verdict.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthRejection`] (always 401) when the request cannot be
    /// authenticated.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<ClaimsIdentity, AuthRejection> {
        let Some(raw) = headers.get(AUTHORIZATION) else {
            return self.handle_missing_header();
        };

        let Ok(header) = raw.to_str() else {
            error!("Authorization header is not valid ASCII");
            return Err(AuthRejection::new("Invalid Authorization header format"));
        };

        let Some(token) = extract_bearer_token(header) else {
            error!("Authorization header does not match the Bearer scheme");
            return Err(AuthRejection::new("Invalid Authorization header format"));
        };

        if self.config.log_tokens {
            warn!(token, "full bearer token (opt-in logging)");
        } else {
            debug!(preview = %token_preview(token), "validating bearer token");
        }

        match self.validator.validate(token).await {
            Ok(identity) => {
                debug!("bearer token validated");
                if self.config.log_tokens {
                    warn!(
                        issuer = identity.issuer(),
                        audience = identity.audience(),
                        subject = identity.subject(),
                        service_url = identity.service_url(),
                        "decoded token claims (opt-in logging)"
                    );
                }
                Ok(identity)
            }
            Err(ValidationError::Rejected(msg)) => {
                error!(reason = %msg, "bearer token rejected");
                Err(AuthRejection::new(format!("JWT validation failed: {msg}")))
            }
            Err(ValidationError::Fault(msg)) => {
                error!(reason = %msg, "token validator fault");
                Err(AuthRejection::new(format!("Authentication error: {msg}")))
            }
        }
    }

    fn handle_missing_header(&self) -> Result<ClaimsIdentity, AuthRejection> {
        if self.config.requires_auth() {
            error!("Authorization header required but not found");
            Err(AuthRejection::new("Authorization header not found"))
        } else {
            debug!("no client id configured; attaching anonymous claims");
            Ok(self.validator.anonymous_claims())
        }
    }
}

/// Axum middleware applying the gate to the ingestion route only.
///
/// On success the resolved identity is inserted into request extensions for
/// the downstream handler; on rejection the response pipeline
/// short-circuits and no downstream component runs.
pub async fn auth_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != MESSAGES_PATH {
        return next.run(request).await;
    }

    match state.gate.authenticate(request.headers()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Extracts the token from an exact `Bearer <token>` header value.
///
/// Exactly two tokens separated by a single space, case-sensitive scheme
/// name, non-empty token. Anything else is a malformed header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
        return None;
    }
    Some(parts[1])
}

/// A short, non-reversible preview of a token for debug logs.
fn token_preview(token: &str) -> String {
    match (token.get(..8), token.get(token.len().saturating_sub(8)..)) {
        (Some(head), Some(tail)) if token.len() >= 24 => format!("{head}...{tail}"),
        _ => "[redacted]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http_body_util::BodyExt;
    use proptest::prelude::*;
    use serde_json::Value;
    use std::collections::HashMap;

    /// Validator with a scripted verdict.
    enum StubValidator {
        Accept(ClaimsIdentity),
        Reject(String),
        Fault(String),
    }

    #[async_trait::async_trait]
    impl TokenValidator for StubValidator {
        async fn validate(&self, _token: &str) -> Result<ClaimsIdentity, ValidationError> {
            match self {
                Self::Accept(identity) => Ok(identity.clone()),
                Self::Reject(msg) => Err(ValidationError::Rejected(msg.clone())),
                Self::Fault(msg) => Err(ValidationError::Fault(msg.clone())),
            }
        }

        fn anonymous_claims(&self) -> ClaimsIdentity {
            ClaimsIdentity::anonymous()
        }
    }

    fn gate(config: AuthConfig, validator: StubValidator) -> AuthGate {
        AuthGate::new(Arc::new(config), Arc::new(validator))
    }

    fn configured() -> AuthConfig {
        AuthConfig {
            client_id: Some("client-123".to_string()),
            ..AuthConfig::default()
        }
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn sample_identity() -> ClaimsIdentity {
        let mut claims = HashMap::new();
        claims.insert("sub".to_string(), serde_json::json!("user-7"));
        ClaimsIdentity::new(claims)
    }

    #[tokio::test]
    async fn missing_header_without_client_id_is_anonymous() {
        let gate = gate(AuthConfig::anonymous(), StubValidator::Fault("unused".into()));

        let identity = gate.authenticate(&HeaderMap::new()).await.unwrap();
        assert!(!identity.is_authenticated());
    }

    #[tokio::test]
    async fn missing_header_with_client_id_is_rejected() {
        let gate = gate(configured(), StubValidator::Accept(sample_identity()));

        let rejection = gate.authenticate(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(rejection.message(), "Authorization header not found");
    }

    #[tokio::test]
    async fn malformed_header_shapes_are_rejected() {
        let gate = gate(configured(), StubValidator::Accept(sample_identity()));

        for header in [
            "Bearer",
            "Bearer ",
            "Bearer a b",
            "Bearer  abc",
            "bearer abc",
            "Basic abc",
            "abc",
        ] {
            let rejection = gate.authenticate(&bearer(header)).await.unwrap_err();
            assert_eq!(
                rejection.message(),
                "Invalid Authorization header format",
                "header value: {header:?}"
            );
        }
    }

    #[tokio::test]
    async fn accepted_token_forwards_identity_unchanged() {
        let expected = sample_identity();
        let gate = gate(configured(), StubValidator::Accept(expected.clone()));

        let identity = gate.authenticate(&bearer("Bearer abc123")).await.unwrap();
        assert_eq!(identity, expected);
    }

    #[tokio::test]
    async fn validator_rejection_maps_to_jwt_validation_failed() {
        let gate = gate(configured(), StubValidator::Reject("expired".into()));

        let rejection = gate.authenticate(&bearer("Bearer abc123")).await.unwrap_err();
        assert_eq!(rejection.message(), "JWT validation failed: expired");
    }

    #[tokio::test]
    async fn validator_fault_maps_to_authentication_error() {
        let gate = gate(configured(), StubValidator::Fault("key fetch failed".into()));

        let rejection = gate.authenticate(&bearer("Bearer abc123")).await.unwrap_err();
        assert_eq!(
            rejection.message(),
            "Authentication error: key fetch failed"
        );
    }

    #[tokio::test]
    async fn rejection_response_is_401_with_error_body() {
        let response = AuthRejection::new("Authorization header not found").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Authorization header not found");
    }

    #[test]
    fn bearer_extraction_accepts_exact_form_only() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer a.b.c"), Some("a.b.c"));
        assert_eq!(extract_bearer_token("Bearer"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn token_preview_redacts_short_tokens() {
        assert_eq!(token_preview("short"), "[redacted]");

        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let preview = token_preview(long);
        assert_eq!(preview, "abcdefgh...23456789");
        assert!(!preview.contains("ijklmnop"));
    }

    proptest! {
        /// Any header value not matching `Bearer <single-token>` yields no token.
        #[test]
        fn non_bearer_shapes_never_extract(header in "[ -~]{0,40}") {
            let well_formed = header
                .strip_prefix("Bearer ")
                .is_some_and(|t| !t.is_empty() && !t.contains(' '));

            if !well_formed {
                prop_assert_eq!(extract_bearer_token(&header), None);
            }
        }
    }
}
