//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request counters, latency histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The tracing sink is the only shared mutable resource on the request
//!   path; the subscriber is safe for concurrent writes
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
