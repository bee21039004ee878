//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream target is a usable http(s) URL
//! - Validate value ranges (timeouts > 0, body cap > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validates the merged transport view, so override mistakes surface early
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, TransportOptions};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("upstream target '{0}' is not a valid URL")]
    InvalidTarget(String),

    #[error("upstream target '{0}' has no host")]
    TargetMissingHost(String),

    #[error("upstream target scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let transport = config.upstream.clone().apply(TransportOptions::default());
    validate_transport(&transport, &mut errors);

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_transport(transport: &TransportOptions, errors: &mut Vec<ValidationError>) {
    match Url::parse(&transport.target) {
        Ok(url) => {
            if url.host_str().is_none() {
                errors.push(ValidationError::TargetMissingHost(transport.target.clone()));
            }
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
        }
        Err(_) => errors.push(ValidationError::InvalidTarget(transport.target.clone())),
    }

    if transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_timeout_secs"));
    }
    if transport.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_timeout_secs"));
    }
}
