//! Validated caller identities.
//!
//! A [`ClaimsIdentity`] is the output of token validation: an immutable map
//! of verified claims plus an authenticated flag. The anonymous identity is
//! a placeholder used when no client identifier is configured, which permits
//! unauthenticated local testing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The validated, structured result of verifying a bearer token.
///
/// Immutable once produced: created per request during validation (or
/// synthesized anonymous), attached to request-scoped state, discarded at
/// request end. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    claims: HashMap<String, Value>,
    authenticated: bool,
}

impl ClaimsIdentity {
    /// Creates an authenticated identity from a verified claim map.
    #[must_use]
    pub fn new(claims: HashMap<String, Value>) -> Self {
        Self {
            claims,
            authenticated: true,
        }
    }

    /// Creates the anonymous placeholder identity.
    ///
    /// Used when no client identifier is configured and a request arrives
    /// without an `Authorization` header.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            claims: HashMap::new(),
            authenticated: false,
        }
    }

    /// Returns true unless this is the anonymous identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Looks up a claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Looks up a claim expected to be a string.
    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// The token issuer (`iss` claim).
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.string_claim("iss")
    }

    /// The intended audience (`aud` claim).
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.string_claim("aud")
    }

    /// The subject (`sub` claim).
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
    }

    /// Expiry as seconds since the Unix epoch (`exp` claim).
    #[must_use]
    pub fn expiry(&self) -> Option<i64> {
        self.claims.get("exp").and_then(Value::as_i64)
    }

    /// The service callback URL (`serviceurl` claim) used for outbound
    /// replies to the channel.
    #[must_use]
    pub fn service_url(&self) -> Option<&str> {
        self.string_claim("serviceurl")
    }
}
