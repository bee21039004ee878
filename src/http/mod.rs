//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → request.rs (buffer body, parse per declared content type)
//!     → proxy::engine (forward, rewrite, hooks)
//!     → response streamed back to the client
//! ```

pub mod request;
pub mod server;

pub use request::InboundRequest;
pub use server::HttpServer;
