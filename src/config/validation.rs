//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, header values and value ranges
//! - Check static mounts are usable route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::RouterConfig;

/// A semantic problem in an otherwise well-formed config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("cors.allow_origin `{0}` is not a valid header value")]
    AllowOrigin(String),

    #[error("timeouts.request_secs must be greater than 0")]
    RequestTimeout,

    #[error("static_dirs prefix `{0}` must start with `/`")]
    StaticPrefix(String),

    #[error("static_dirs entry for `{0}` has an empty dir")]
    StaticDir(String),
}

/// Check a parsed config, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if HeaderValue::from_str(&config.cors.allow_origin).is_err() {
        errors.push(ValidationError::AllowOrigin(config.cors.allow_origin.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    for mount in &config.static_dirs {
        if !mount.prefix.starts_with('/') {
            errors.push(ValidationError::StaticPrefix(mount.prefix.clone()));
        }
        if mount.dir.trim().is_empty() {
            errors.push(ValidationError::StaticDir(mount.prefix.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
