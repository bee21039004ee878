//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the wildcard proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind the server to a listener
//! - Hand each inbound request to the forwarding engine

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::ProxyConfig;
use crate::http::request::parse_inbound;
use crate::observability::metrics;
use crate::proxy::ForwardingEngine;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
    pub max_body_size: usize,
}

/// HTTP server hosting the forwarding engine.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a constructed engine.
    pub fn new(engine: ForwardingEngine, config: &ProxyConfig) -> Self {
        let request_timeout = Duration::from_secs(engine.options().request_timeout_secs);
        let state = AppState {
            engine: Arc::new(engine),
            max_body_size: config.limits.max_body_size,
        };

        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: parse the inbound request and forward it.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let inbound = match parse_inbound(request, Some(addr), state.max_body_size).await {
        Ok(inbound) => inbound,
        Err(e) => {
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), start_time);
            return response;
        }
    };

    match state.engine.forward(inbound).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            response.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Forwarding failed");
            metrics::record_request(&method, StatusCode::BAD_GATEWAY.as_u16(), start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
