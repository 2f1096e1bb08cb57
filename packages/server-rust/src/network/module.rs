//! Network module with deferred startup lifecycle.
//!
//! `new()` wires shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. The split lets callers
//! learn the bound port (port 0 is OS-assigned) before traffic flows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use agentgate_core::{ActivityProcessor, AuthConfig, ConnectionSettings, TokenValidator};

use super::auth::{auth_gate_middleware, AuthGate};
use super::config::NetworkConfig;
use super::handlers::{
    health_handler, liveness_handler, messages_handler, readiness_handler, root_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Wires the module from its injected collaborators.
    ///
    /// The validator and processor are externally owned handles, constructed
    /// once here and shared with every request.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        auth: Arc<AuthConfig>,
        validator: Arc<dyn TokenValidator>,
        processor: Arc<dyn ActivityProcessor>,
        connections: Arc<ConnectionSettings>,
    ) -> Self {
        let state = AppState {
            gate: Arc::new(AuthGate::new(auth, validator)),
            processor,
            connections,
            shutdown: Arc::new(ShutdownController::new()),
        };

        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /` -- service banner
    /// - `GET /health` -- fixed healthy-status payload
    /// - `GET /health/live`, `GET /health/ready` -- orchestrator probes
    /// - `POST /api/messages` -- authenticated message ingestion
    ///
    /// The auth gate layer wraps every route but only acts on the ingestion
    /// route; the transport layers wrap the gate.
    #[must_use]
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/api/messages", post(messages_handler))
            .layer(from_fn_with_state(self.state.clone(), auth_gate_middleware))
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured one
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves or the shutdown
    /// controller is triggered, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal I/O failure.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called first.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let router = self.build_router();
        let controller = Arc::clone(&self.state.shutdown);

        // Stop serving on either the caller's future or a programmatic
        // trigger_shutdown().
        let mut triggered = controller.shutdown_receiver();
        let signal = async move {
            tokio::select! {
                () = shutdown => {}
                _ = triggered.changed() => {}
            }
        };

        controller.set_ready();

        if let Some(tls) = self.config.tls.clone() {
            serve_tls(listener, router, &tls, signal).await?;
        } else {
            info!("serving plain HTTP connections");
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await?;
        }

        drain(&controller).await;
        Ok(())
    }
}

/// Serves TLS connections via `axum-server` with rustls, reusing the
/// pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &super::config::TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();

    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving TLS connections");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

/// Transitions to draining and waits for in-flight requests to complete.
async fn drain(controller: &ShutdownController) {
    controller.trigger_shutdown();

    if controller.wait_for_drain(Duration::from_secs(30)).await {
        info!("all in-flight requests drained");
    } else {
        warn!("drain timeout expired with requests still in flight");
    }
}
