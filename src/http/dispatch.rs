//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Request
//!     → wrap response sink (started = false)
//!     → scan routes in registration order (method + full path match)
//!     → matched: merge params into query, run handler, stop scanning
//!     → OPTIONS: stamp `Public` header with the path's methods
//!     → nothing written: 404 fallback
//!     → access log line
//!     → Response
//! ```
//!
//! # Design Decisions
//! - At most one handler runs per request, the first registered match
//! - OPTIONS aggregation runs even when an OPTIONS handler already ran
//! - Every request leaves dispatch with a started response

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::HeaderValue;
use axum::http::{Method, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::http::request::{decode_path, inject_params};
use crate::http::response::{not_found, DeliveryStatus, ResponseBuffer, ResponseWrapper, ResponseWriter};
use crate::observability::access_log::{AccessLogEntry, RequestSummary};
use crate::routing::Router;

/// Response header listing the methods available on a path.
pub const PUBLIC: &str = "public";

/// Serves requests against a route table.
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    /// Registration must be finished before the router is handed over.
    pub fn new(router: Router) -> Self {
        Self::from_shared(Arc::new(router))
    }

    pub fn from_shared(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatch one request and report the final response state.
    pub async fn dispatch(&self, mut req: Request<Body>) -> (Response<Body>, DeliveryStatus) {
        let summary = RequestSummary::capture(&req);
        let method = req.method().clone();
        let path = decode_path(req.uri().path());

        let mut w = ResponseWrapper::new(ResponseBuffer::new(), self.router.allow_origin().clone());

        if let Some((route, captures)) = self.router.find(&method, &path) {
            tracing::debug!(
                method = %method,
                path = %path,
                template = %route.pattern().template(),
                "Route matched"
            );
            inject_params(&mut req, route.params(), &captures);
            (route.handler())(req, &mut w).await;
        }

        if method == Method::OPTIONS {
            self.options(&path, &mut w);
        }

        if !w.started() {
            not_found(&mut w);
        }

        let delivery = w.delivery();
        if self.router.logging() {
            self.router
                .access_log()
                .record(&AccessLogEntry::new(summary, delivery));
        }

        (w.into_inner().into_response(), delivery)
    }

    fn options(&self, path: &str, w: &mut dyn ResponseWriter) {
        match HeaderValue::from_str(&self.router.public_header(path)) {
            Ok(value) => {
                w.headers_mut().insert(PUBLIC, value);
            }
            Err(e) => tracing::warn!(error = %e, "Invalid Public header value"),
        }
        w.write_status(StatusCode::OK);
    }
}

impl Service<Request<Body>> for Dispatcher {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move {
            let (response, _) = dispatcher.dispatch(req).await;
            Ok(response)
        })
    }
}
