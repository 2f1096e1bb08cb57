//! Activity processing seam.
//!
//! The external agent runtime is reached through [`ActivityProcessor`]: one
//! call per inbound request, returning a [`ProcessedActivity`] that the
//! transport translates back into a native response. The processor is
//! constructed once at startup and injected by handle; it is never built
//! per-request.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::request::{AdaptedRequest, RequestLike};

/// Result of one activity-processing call.
///
/// A body, when present, is a JSON payload the transport echoes back with
/// the carried status code. No body means plain acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedActivity {
    /// HTTP status code for the native response.
    pub status: u16,
    /// Optional JSON payload bytes.
    pub body: Option<Bytes>,
}

impl ProcessedActivity {
    /// Plain acknowledgement: 200 with no body.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }

    /// A JSON payload with an explicit status code.
    #[must_use]
    pub fn with_json(status: u16, payload: &Value) -> Self {
        Self {
            status,
            body: Some(Bytes::from(payload.to_string())),
        }
    }
}

/// OAuth connection names made available to the processor through the
/// request data bag. The sign-in flows themselves run in the external
/// identity provider; the processor only needs the connection names to
/// initiate them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionSettings {
    /// Connection name for the Microsoft Graph handler.
    pub graph: Option<String>,
    /// Connection name for the GitHub handler.
    pub github: Option<String>,
}

/// Processes one adapted request into a processed-activity result.
#[async_trait]
pub trait ActivityProcessor: Send + Sync {
    /// Handles a single inbound activity.
    ///
    /// The request carries the resolved identity and any injected handles in
    /// its data bag. Called exactly once per inbound request.
    ///
    /// # Errors
    ///
    /// Any error is a downstream processing fault; the transport translates
    /// it to a 500 response.
    async fn process(&self, request: &AdaptedRequest) -> anyhow::Result<ProcessedActivity>;
}

/// Processor that acknowledges every activity without acting on it.
///
/// Default wiring for the server binary when no agent runtime is attached,
/// and a convenient stand-in for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProcessor;

#[async_trait]
impl ActivityProcessor for NullProcessor {
    async fn process(&self, request: &AdaptedRequest) -> anyhow::Result<ProcessedActivity> {
        let activity_type = request
            .json()?
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        debug!(activity_type, "null processor acknowledged activity");

        Ok(ProcessedActivity::ok())
    }
}
