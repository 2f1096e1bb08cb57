//! `AgentGate` server binary.
//!
//! Parses configuration from CLI flags and environment variables, wires the
//! token validator and activity processor, and serves until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agentgate_core::{
    ActivityProcessor, AuthConfig, ConnectionSettings, JwtTokenValidator, NullProcessor,
    TokenValidator,
};
use agentgate_server::network::{NetworkConfig, NetworkModule};

#[derive(Parser, Debug)]
#[command(name = "agentgate-server", version, about = "AgentGate agent message server")]
struct Args {
    /// Bind address.
    #[arg(long, env = "HOST", default_value = "localhost")]
    host: String,

    /// Listen port. 0 means OS-assigned.
    #[arg(long, env = "PORT", default_value_t = 3978)]
    port: u16,

    /// Expected client identifier. When unset the server runs in anonymous
    /// mode and accepts unauthenticated requests.
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    /// Tenant identifier, recorded for diagnostics.
    #[arg(long, env = "TENANT_ID")]
    tenant_id: Option<String>,

    /// Expected token issuer. Unchecked when unset.
    #[arg(long, env = "JWT_ISSUER")]
    jwt_issuer: Option<String>,

    /// Shared secret for HS256 token verification.
    #[arg(long, env = "JWT_SIGNING_SECRET", hide_env_values = true)]
    jwt_signing_secret: Option<String>,

    /// Log full bearer tokens in plaintext. Local debugging only.
    #[arg(long, env = "LOG_JWT_TOKENS")]
    log_jwt_tokens: bool,

    /// OAuth connection name for the Microsoft Graph handler.
    #[arg(long, env = "GRAPH_CONNECTION_NAME")]
    graph_connection_name: Option<String>,

    /// OAuth connection name for the GitHub handler.
    #[arg(long, env = "GITHUB_CONNECTION_NAME")]
    github_connection_name: Option<String>,

    /// Maximum request duration in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let network = NetworkConfig {
        host: args.host.clone(),
        port: args.port,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        ..NetworkConfig::default()
    };

    let auth = Arc::new(AuthConfig {
        client_id: args.client_id,
        tenant_id: args.tenant_id,
        issuer: args.jwt_issuer,
        signing_secret: args.jwt_signing_secret,
        log_tokens: args.log_jwt_tokens,
    });
    if !auth.requires_auth() {
        warn!("no CLIENT_ID configured; running in anonymous mode");
    }

    let validator: Arc<dyn TokenValidator> = Arc::new(JwtTokenValidator::new(&auth));
    let processor: Arc<dyn ActivityProcessor> = Arc::new(NullProcessor);
    let connections = Arc::new(ConnectionSettings {
        graph: args.graph_connection_name,
        github: args.github_connection_name,
    });

    let mut module = NetworkModule::new(network, auth, validator, processor, connections);
    let port = module.start().await?;
    info!(host = %args.host, port, "AgentGate server listening");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}
