//! Startup orchestration.
//!
//! # Responsibilities
//! - Apply validated configuration to the route table
//! - Register configured static mounts
//! - Surface every configuration problem before serving starts
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned to the caller, which must
//!   not start serving
//! - Static mounts are registered after application routes, so explicit
//!   routes under the same prefix take priority

use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;

use crate::config::{AccessLogTarget, ConfigError, RouterConfig};
use crate::observability::access_log::{StdoutAccessLog, TracingAccessLog};
use crate::routing::{PatternError, Router};

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("invalid allow origin: {0}")]
    AllowOrigin(#[from] InvalidHeaderValue),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Apply `config` to `router` and register its static mounts.
pub fn configure_router(router: &mut Router, config: &RouterConfig) -> Result<(), StartupError> {
    router.set_logging(config.logging.enabled);
    router.set_allow_origin(&config.cors.allow_origin)?;
    match config.logging.access_log {
        AccessLogTarget::Tracing => router.set_access_log(Arc::new(TracingAccessLog)),
        AccessLogTarget::Stdout => router.set_access_log(Arc::new(StdoutAccessLog)),
    }

    for mount in &config.static_dirs {
        router.static_dir(&mount.prefix, &mount.dir)?;
        tracing::info!(prefix = %mount.prefix, dir = %mount.dir, "Static directory mounted");
    }

    tracing::info!(
        routes = router.routes().len(),
        logging = router.logging(),
        "Router configured"
    );
    Ok(())
}
