//! Forwarding HTTP Reverse Proxy Library
//!
//! Forwards inbound requests to a single configured upstream, rewriting
//! parsed request bodies back into wire format on the way out and logging
//! each request/response pair.

pub mod config;
pub mod http;
pub mod observability;
pub mod proxy;

pub use config::resolver::{DependencyRegistry, OptionsSource, ProxyOptions};
pub use config::schema::{ProxyConfig, TransportOptions};
pub use http::HttpServer;
pub use proxy::ForwardingEngine;
