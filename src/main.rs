//! route-mux server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ axum::serve ──▶ Dispatcher ──▶ Router (ordered scan)
//!                                        │                │
//!                                        │                ▼
//!                                        │          matched Route
//!                                        │                │
//!                                        ▼                ▼
//!     Client Response            ResponseWrapper ◀── handler(req, w)
//!     ◀───────────── buffer ◀──  (started/size/status,
//!                                 Content-Length, CORS)
//!                                        │
//!                                        ▼
//!                                   access log
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use route_mux::config::{load_config, RouterConfig};
use route_mux::http::{serve_formatted, serve_json, HttpServer, RequestParamsExt};
use route_mux::lifecycle::{configure_router, signals, Shutdown, StartupError};
use route_mux::observability::logging::init_logging;
use route_mux::Router;

#[derive(Parser, Debug)]
#[command(name = "route-mux", version, about = "Regex-based HTTP request router")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename = "user")]
struct User {
    id: u64,
}

/// Built-in routes served alongside configured static mounts.
fn register_routes(router: &mut Router) -> Result<(), StartupError> {
    router.get("/health", |_req, w| {
        Box::pin(async move { serve_json(w, &Health { status: "ok" }) })
    })?;

    router.get("/user/:id([0-9]+)", |req, w| {
        Box::pin(async move {
            let accept = req
                .headers()
                .get(axum::http::header::ACCEPT)
                .and_then(|v| v.to_str().ok());
            match req.param("id").and_then(|id| id.parse().ok()) {
                Some(id) => serve_formatted(w, accept, &User { id }),
                None => route_mux::http::not_found(w),
            }
        })
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.logging);
    tracing::info!("route-mux v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        static_dirs = config.static_dirs.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let mut router = Router::new();
    register_routes(&mut router)?;
    configure_router(&mut router, &config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config, router)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
