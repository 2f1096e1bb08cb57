//! Transport-level HTTP middleware stack.
//!
//! Builds the Tower layer pipeline applied to every route. Ordering follows
//! the outer-to-inner convention: the first layer listed processes the
//! request first on the way in and the response last on the way out. The
//! bearer auth gate is not part of this stack; it is applied as axum
//! middleware so it can short-circuit per-route.

use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;

/// The composed Tower layer type produced by [`build_http_layers`].
///
/// Each layer wraps the next in a `Stack`, innermost first.
type HttpLayers = tower::layer::util::Stack<
    PropagateRequestIdLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            RequestBodyLimitLayer,
            tower::layer::util::Stack<
                MapResponseBodyLayer<
                    fn(tower_http::limit::ResponseBody<axum::body::Body>) -> axum::body::Body,
                >,
                tower::layer::util::Stack<
                    CorsLayer,
                    tower::layer::util::Stack<
                        TraceLayer<
                            tower_http::classify::SharedClassifier<
                                tower_http::classify::ServerErrorsAsFailures,
                            >,
                        >,
                        tower::layer::util::Stack<
                            SetRequestIdLayer<MakeRequestUuid>,
                            tower::layer::util::Identity,
                        >,
                    >,
                >,
            >,
        >,
    >,
>;

/// Builds the HTTP middleware stack from the network configuration.
///
/// Outermost to innermost:
/// 1. `SetRequestId` -- assigns a UUID v4 `X-Request-Id` to each request
/// 2. `Trace` -- structured request/response spans
/// 3. `CORS` -- based on the configured origins
/// 4. Body size limit -- caps the ingestion payload
/// 5. `Timeout` -- 408 after the configured duration
/// 6. `PropagateRequestId` -- copies `X-Request-Id` onto the response
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static("x-request-id");

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_origins))
        // Type-erases the body-limit response body so the CORS layer's
        // `ResBody: Default` bound is satisfied; no behavioral effect.
        .layer(MapResponseBodyLayer::new(
            axum::body::Body::new
                as fn(tower_http::limit::ResponseBody<axum::body::Body>) -> axum::body::Body,
        ))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .into_inner()
}

/// Builds the CORS layer from the configured origin list.
///
/// A `"*"` entry allows any origin; otherwise each entry is parsed into an
/// explicit allowlist.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn build_http_layers_with_defaults() {
        let _layers = build_http_layers(&NetworkConfig::default());
    }

    #[test]
    fn build_http_layers_with_custom_timeout() {
        let config = NetworkConfig {
            request_timeout: Duration::from_secs(5),
            ..NetworkConfig::default()
        };
        let _layers = build_http_layers(&config);
    }

    #[test]
    fn cors_layer_accepts_wildcard_and_explicit_origins() {
        let _wildcard = build_cors_layer(&["*".to_string()]);
        let _explicit = build_cors_layer(&[
            "http://localhost:3978".to_string(),
            "https://channel.example.com".to_string(),
        ]);
    }
}
