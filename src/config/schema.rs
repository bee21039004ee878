//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::session::SessionOptions;

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Runtime mode; controls session cookie hardening.
    pub runtime_mode: RuntimeMode,

    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Upstream transport overrides, merged over [`TransportOptions::default`].
    pub upstream: TransportOverrides,

    /// Session cookie contract handed to the wiring layer.
    pub session: SessionOptions,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Runtime mode of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Resolved transport options for the upstream connection.
///
/// Built once by the options resolver and owned by the forwarding engine;
/// never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportOptions {
    /// Upstream target URL (e.g., "http://127.0.0.1:3000").
    pub target: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Verify the upstream TLS certificate chain.
    pub tls_verify: bool,

    /// Rewrite the outbound Host header to the upstream authority.
    pub rewrite_host: bool,

    /// Append the client address to X-Forwarded-For.
    pub x_forwarded_for: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            target: "http://127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            tls_verify: true,
            rewrite_host: true,
            x_forwarded_for: true,
        }
    }
}

/// Caller-supplied transport overrides.
///
/// Every field is optional; unset fields retain the default. Merging is
/// shallow and happens once, at options resolution time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportOverrides {
    pub target: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub tls_verify: Option<bool>,
    pub rewrite_host: Option<bool>,
    pub x_forwarded_for: Option<bool>,
}

impl TransportOverrides {
    /// Apply these overrides over a base configuration, field by field.
    pub fn apply(self, base: TransportOptions) -> TransportOptions {
        TransportOptions {
            target: self.target.unwrap_or(base.target),
            connect_timeout_secs: self.connect_timeout_secs.unwrap_or(base.connect_timeout_secs),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(base.request_timeout_secs),
            tls_verify: self.tls_verify.unwrap_or(base.tls_verify),
            rewrite_host: self.rewrite_host.unwrap_or(base.rewrite_host),
            x_forwarded_for: self.x_forwarded_for.unwrap_or(base.x_forwarded_for),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
