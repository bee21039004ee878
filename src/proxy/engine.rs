//! The forwarding engine.
//!
//! # Responsibilities
//! - Own the shared upstream client and the resolved transport options
//! - Prepare the outbound request (hop-by-hop stripping, host rewrite,
//!   X-Forwarded-For)
//! - Invoke the lifecycle hooks around the upstream exchange
//! - Stream the upstream response back without touching its body
//!
//! # Design Decisions
//! - One engine serves all in-flight requests; each forwarding operation
//!   builds its own transient state, so no locks are needed
//! - Upstream failures are returned to the caller of that request and never
//!   affect the engine or other requests
//! - When the client disconnects, the in-flight future is dropped before the
//!   upstream response arrives, so `after_forward` (and its "Received" log
//!   line) never runs for abandoned requests

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::schema::TransportOptions;
use crate::config::ConfigError;
use crate::http::request::InboundRequest;
use crate::proxy::hooks::{ForwardHooks, InboundResponse, LoggingHooks, OutboundRequest};
use crate::proxy::tls::InsecureVerifier;
use crate::proxy::ForwardError;

/// Shared client for upstream connections.
pub type UpstreamClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Body>;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Connection-scoped headers are never forwarded upstream.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Forwards inbound requests to the configured upstream target.
pub struct ForwardingEngine {
    client: UpstreamClient,
    options: TransportOptions,
    scheme: Scheme,
    authority: Authority,
    hooks: Arc<dyn ForwardHooks>,
}

impl std::fmt::Debug for ForwardingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingEngine")
            .field("options", &self.options)
            .field("scheme", &self.scheme)
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl ForwardingEngine {
    /// Create an engine with the default logging/rewrite hooks.
    pub fn new(options: TransportOptions) -> Result<Self, ConfigError> {
        Self::with_hooks(options, Arc::new(LoggingHooks))
    }

    /// Create an engine with custom lifecycle hooks.
    pub fn with_hooks(
        options: TransportOptions,
        hooks: Arc<dyn ForwardHooks>,
    ) -> Result<Self, ConfigError> {
        let target: Uri = options.target.parse().map_err(|e| ConfigError::InvalidTarget {
            target: options.target.clone(),
            reason: format!("{e}"),
        })?;

        let scheme = target
            .scheme()
            .cloned()
            .ok_or_else(|| ConfigError::InvalidTarget {
                target: options.target.clone(),
                reason: "missing scheme".to_string(),
            })?;
        let authority = target
            .authority()
            .cloned()
            .ok_or_else(|| ConfigError::InvalidTarget {
                target: options.target.clone(),
                reason: "missing authority".to_string(),
            })?;

        let client = build_client(&options)?;

        Ok(Self {
            client,
            options,
            scheme,
            authority,
            hooks,
        })
    }

    /// The resolved transport options this engine was built with.
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Forward one inbound request to the upstream target.
    pub async fn forward(&self, inbound: InboundRequest) -> Result<Response<Body>, ForwardError> {
        let InboundRequest {
            method,
            path_and_query,
            headers,
            client_addr,
            body,
            payload,
        } = inbound;

        let mut outbound_headers = strip_hop_by_hop(&headers);
        if self.options.rewrite_host {
            if let Ok(value) = HeaderValue::from_str(self.authority.as_str()) {
                outbound_headers.insert(header::HOST, value);
            }
        }
        if self.options.x_forwarded_for {
            if let Some(addr) = client_addr {
                append_forwarded_for(&mut outbound_headers, addr.ip());
            }
        }

        let mut outbound = OutboundRequest::new(
            method.clone(),
            path_and_query.clone(),
            outbound_headers,
            body,
            payload,
        );
        self.hooks.before_forward(&mut outbound)?;

        let (out_method, out_path, out_headers, out_payload) = outbound.into_parts();
        let upstream_host = out_headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        let uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(out_path.as_str())
            .build()?;

        let mut builder = Request::builder().method(out_method).uri(uri);
        if let Some(request_headers) = builder.headers_mut() {
            *request_headers = out_headers;
        }
        let request = builder.body(Body::from(out_payload))?;

        let response = self.client.request(request).await?;

        self.hooks.after_forward(&InboundResponse {
            method,
            host: upstream_host,
            path: path_and_query,
            status: response.status(),
        });

        Ok(response.map(Body::new))
    }
}

/// Build the shared upstream client with pooling and TLS per the options.
fn build_client(options: &TransportOptions) -> Result<UpstreamClient, ConfigError> {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(options.connect_timeout_secs)));
    connector.enforce_http(false); // allow both http and https targets

    let connector = if options.tls_verify {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector)
    } else {
        tracing::warn!("TLS certificate verification disabled for upstream connections");
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(
                rustls::ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(InsecureVerifier))
                    .with_no_client_auth(),
            )
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector)
    };

    Ok(Client::builder(TokioExecutor::new()).build(connector))
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: std::net::IpAddr) {
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {ip}"),
        None => ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
