//! HTTP handler definitions for the `AgentGate` server.
//!
//! Defines `AppState` (the shared state carried through axum extractors)
//! and re-exports the handler functions used when building the router.

pub mod health;
pub mod messages;

pub use health::{health_handler, liveness_handler, readiness_handler, root_handler};
pub use messages::messages_handler;

use std::sync::Arc;

use agentgate_core::{ActivityProcessor, ConnectionSettings};

use super::auth::AuthGate;
use super::shutdown::ShutdownController;

/// Shared application state passed to all axum handlers via `State`.
///
/// Every field is an `Arc` handle to a resource owned for the process
/// lifetime and injected at startup; nothing here is built per-request.
#[derive(Clone)]
pub struct AppState {
    /// Bearer auth gate for the ingestion route.
    pub gate: Arc<AuthGate>,
    /// The external activity processor.
    pub processor: Arc<dyn ActivityProcessor>,
    /// OAuth connection names handed to the processor.
    pub connections: Arc<ConnectionSettings>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
}
