//! Token validation seam.
//!
//! [`TokenValidator`] is the narrow interface the auth gate consumes. The
//! default implementation, [`JwtTokenValidator`], verifies HS256-signed JWTs
//! against the configured trust parameters. Validators that reach out to a
//! remote key set can implement the same trait; `validate` is async for that
//! reason.

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthConfig;
use crate::claims::ClaimsIdentity;

/// Why a token was not accepted.
///
/// The two variants drive the two distinct 401 messages at the HTTP
/// boundary: [`Rejected`](ValidationError::Rejected) for tokens that failed
/// verification, [`Fault`](ValidationError::Fault) for failures of the
/// validator itself. Neither ever surfaces as a 500.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The token is malformed, expired, or untrusted.
    #[error("{0}")]
    Rejected(String),
    /// The validator failed for a reason unrelated to the token contents.
    #[error("{0}")]
    Fault(String),
}

/// Validates bearer tokens and produces claims identities.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Verifies a raw token string and returns the validated identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Rejected`] when the token fails
    /// verification and [`ValidationError::Fault`] when the validator itself
    /// cannot run.
    async fn validate(&self, token: &str) -> Result<ClaimsIdentity, ValidationError>;

    /// Returns the anonymous placeholder identity for unauthenticated mode.
    fn anonymous_claims(&self) -> ClaimsIdentity;
}

/// JWT validator backed by a shared HS256 signing secret.
///
/// Checks signature, expiry, audience (the configured client id), and
/// issuer when one is configured.
pub struct JwtTokenValidator {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtTokenValidator {
    /// Builds a validator from the trust configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(client_id) = &config.client_id {
            validation.set_audience(&[client_id]);
        }
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: config
                .signing_secret
                .as_ref()
                .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> Result<ClaimsIdentity, ValidationError> {
        let key = self.key.as_ref().ok_or_else(|| {
            ValidationError::Fault("no signing secret configured".to_string())
        })?;

        let data = jsonwebtoken::decode::<HashMap<String, Value>>(token, key, &self.validation)
            .map_err(translate_jwt_error)?;

        Ok(ClaimsIdentity::new(data.claims))
    }

    fn anonymous_claims(&self) -> ClaimsIdentity {
        ClaimsIdentity::anonymous()
    }
}

/// Maps `jsonwebtoken` errors onto the validation taxonomy.
///
/// Everything attributable to the presented token is `Rejected`; crypto or
/// configuration failures inside the library are a `Fault`.
fn translate_jwt_error(err: jsonwebtoken::errors::Error) -> ValidationError {
    match err.kind() {
        ErrorKind::ExpiredSignature => ValidationError::Rejected("token is expired".to_string()),
        ErrorKind::ImmatureSignature => {
            ValidationError::Rejected("token is not yet valid".to_string())
        }
        ErrorKind::InvalidSignature => ValidationError::Rejected("invalid signature".to_string()),
        ErrorKind::InvalidAudience => ValidationError::Rejected("invalid audience".to_string()),
        ErrorKind::InvalidIssuer => ValidationError::Rejected("invalid issuer".to_string()),
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => {
            ValidationError::Rejected("malformed token".to_string())
        }
        _ => ValidationError::Fault(err.to_string()),
    }
}
