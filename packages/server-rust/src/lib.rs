//! `AgentGate` server — HTTP transport that gates and adapts inbound agent messages.
//!
//! The server exposes a single authenticated ingestion route
//! (`POST /api/messages`) guarded by the bearer auth gate, reshapes each
//! accepted request into the form the activity pipeline consumes, and
//! translates the pipeline's result back into an HTTP response.

pub mod network;
