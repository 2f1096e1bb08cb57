//! Authentication trust configuration.

/// Trust parameters for inbound token validation.
///
/// Loaded once at process start and passed by `Arc` into the auth gate and
/// the validator — there is no global lookup. Read-only for the process
/// lifetime.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// The expected client identifier (`aud` claim). When absent the server
    /// runs in anonymous mode and accepts requests without a token.
    pub client_id: Option<String>,
    /// Optional tenant identifier, recorded for diagnostics.
    pub tenant_id: Option<String>,
    /// Expected token issuer. When absent the issuer is not checked.
    pub issuer: Option<String>,
    /// Shared secret for HS256 signature verification.
    pub signing_secret: Option<String>,
    /// Opt-in full-token logging for local debugging. Defaults to off;
    /// enabling it emits a startup warning.
    pub log_tokens: bool,
}

impl AuthConfig {
    /// Configuration for anonymous mode: no client identifier, no trust
    /// checks, tokens never required.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Whether inbound requests to the ingestion route must carry a token.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.client_id.is_some()
    }
}
