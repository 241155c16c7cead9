//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the dispatcher as its only service
//! - Wire up middleware (request timeout)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router as AxumRouter;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::config::RouterConfig;
use crate::http::dispatch::Dispatcher;
use crate::routing::Router;

/// HTTP server hosting a route table.
pub struct HttpServer {
    app: AxumRouter,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a server for a fully registered router.
    pub fn new(config: RouterConfig, router: Router) -> Self {
        let dispatcher = Dispatcher::new(router);
        let app = Self::build_app(&config, dispatcher);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &RouterConfig, dispatcher: Dispatcher) -> AxumRouter {
        AxumRouter::new()
            .fallback_service(dispatcher)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}
