//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) ──► loader.rs (parse & deserialize)
//!                            │
//! caller options ──────► resolver.rs (static / factory / existing / class)
//!                            │
//!                        validation.rs (semantic checks)
//!                            │
//!                        merge over defaults (shallow, field-by-field)
//!                            │
//!                        TransportOptions (resolved, immutable)
//!                            │
//!                        owned by the forwarding engine
//! ```
//!
//! # Design Decisions
//! - Options are resolved exactly once, before the engine is constructed
//! - A failed resolution aborts startup; no fallback to defaults
//! - All file-level fields have defaults so an empty config file works
//! - Session options are a passive contract value, resolved alongside

pub mod loader;
pub mod resolver;
pub mod schema;
pub mod session;
pub mod validation;

pub use resolver::{DependencyRegistry, OptionsFactory, OptionsSource, ProxyOptions};
pub use schema::{ProxyConfig, RuntimeMode, TransportOptions, TransportOverrides};
pub use session::{ResolvedSession, SessionOptions};

use thiserror::Error;
use validation::ValidationError;

/// Error type for configuration loading and resolution.
///
/// Any variant produced during startup is fatal: the proxy subsystem is not
/// constructed and no partially-resolved configuration escapes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),

    #[error("no options source supplied: expected one of factory, existing, or class")]
    NoSource,

    #[error("missing dependency '{0}' for options factory")]
    MissingDependency(String),

    #[error("options factory failed: {0}")]
    Factory(String),

    #[error("invalid upstream target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}
