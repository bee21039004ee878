//! Proxy forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request (parsed by http::request)
//!     → engine.rs (header rewrite, hook invocation)
//!     → hooks.rs  before_forward: log "Sending", re-serialize parsed body
//!     → rewrite.rs (JSON / form wire formats, content-length correlation)
//!     → upstream client (hyper legacy client, pooled)
//!     → hooks.rs  after_forward: log "Received"
//!     → response streamed back to the client
//! ```
//!
//! # Design Decisions
//! - Hooks are explicit trait methods invoked in order, not ambient events,
//!   so ordering and error propagation stay visible
//! - One engine instance serves all in-flight requests; per-request state is
//!   never shared, only the immutable transport options are
//! - The engine never retries, caches, or touches response bodies

pub mod engine;
pub mod hooks;
pub mod rewrite;
pub mod tls;
pub mod url;

pub use engine::ForwardingEngine;
pub use hooks::{ForwardHooks, InboundResponse, LoggingHooks, OutboundRequest};
pub use rewrite::ParsedBody;

use thiserror::Error;

/// Error type for a single forwarding operation.
///
/// These are request-scoped: they surface to the caller of that request and
/// leave the shared engine and other in-flight requests untouched.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to build upstream request: {0}")]
    BuildRequest(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}
