//! Route table, registration and lookup.
//!
//! # Responsibilities
//! - Compile templates and store routes in registration order
//! - Find the first route matching a method and path
//! - Aggregate the methods available on a path (OPTIONS)
//! - Carry per-router settings (access log, cross-origin default)
//!
//! # Design Decisions
//! - Ordered linear scan: registration order IS match priority
//! - Compile errors are returned to the caller, never deferred to requests
//! - Routes are only added during initialization; the table is then shared
//!   read-only (e.g. behind an `Arc`) and needs no locking. Registering
//!   after serving has started is not supported.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderValue, InvalidHeaderValue};
use axum::http::Request;
use futures_util::future::BoxFuture;

use crate::http::response::ResponseWriter;
use crate::http::static_files::{self, FILEPATH_PARAM};
use crate::observability::access_log::{AccessLogSink, TracingAccessLog};
use crate::routing::pattern::{self, PatternError};
use crate::routing::route::{Method, Route};

/// Default value of the `Access-Control-Allow-Origin` header.
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";

/// Ordered route table.
pub struct Router {
    routes: Vec<Route>,
    logging: bool,
    access_log: Arc<dyn AccessLogSink>,
    allow_origin: HeaderValue,
}

impl Router {
    /// Create an empty router with access logging to `tracing`.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            logging: true,
            access_log: Arc::new(TracingAccessLog),
            allow_origin: HeaderValue::from_static(DEFAULT_ALLOW_ORIGIN),
        }
    }

    /// Compile `template` and append a route for `method`.
    ///
    /// Routes registered earlier take priority over later ones that match
    /// the same request.
    pub fn add_route<F>(
        &mut self,
        method: Method,
        template: &str,
        handler: F,
    ) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        let (pattern, params) = pattern::compile(template)?;

        tracing::debug!(
            method = %method,
            template = %template,
            regex = %pattern.as_str(),
            "Route registered"
        );

        self.routes
            .push(Route::new(method, pattern, params, Arc::new(handler)));
        Ok(&self.routes[self.routes.len() - 1])
    }

    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Method::Get, template, handler)
    }

    pub fn put<F>(&mut self, template: &str, handler: F) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Method::Put, template, handler)
    }

    pub fn del<F>(&mut self, template: &str, handler: F) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Method::Delete, template, handler)
    }

    /// See RFC 5789.
    pub fn patch<F>(&mut self, template: &str, handler: F) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Method::Patch, template, handler)
    }

    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&Route, PatternError>
    where
        F: for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()>
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Method::Post, template, handler)
    }

    /// Serve files below `dir` for every GET under `prefix`.
    ///
    /// The remainder of the path after `prefix` is cleaned before it is
    /// joined to `dir`, so requests cannot escape the directory.
    pub fn static_dir(
        &mut self,
        prefix: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<&Route, PatternError> {
        let root = Arc::new(dir.into());
        let template = format!(
            "{}/:{}(.+)",
            prefix.trim_end_matches('/'),
            FILEPATH_PARAM
        );

        self.add_route(Method::Get, &template, move |req, w| {
            let root = root.clone();
            Box::pin(async move { static_files::serve(&root, req, w).await })
        })
    }

    /// Registered routes in priority order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route registered for `method` whose pattern matches `path`,
    /// with its captured parameter values.
    pub fn find<'r, 'p>(
        &'r self,
        method: &axum::http::Method,
        path: &'p str,
    ) -> Option<(&'r Route, Vec<&'p str>)> {
        self.routes
            .iter()
            .filter(|route| route.method().matches(method))
            .find_map(|route| route.pattern().captures(path).map(|caps| (route, caps)))
    }

    /// Methods available on `path`, regardless of the request method.
    ///
    /// Always includes OPTIONS; a GET route also contributes HEAD. The
    /// result is sorted and deduplicated.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods = BTreeSet::from([Method::Options]);
        for route in self.routes.iter().filter(|r| r.pattern().is_match(path)) {
            methods.insert(route.method());
            if route.method() == Method::Get {
                methods.insert(Method::Head);
            }
        }

        let mut methods: Vec<Method> = methods.into_iter().collect();
        methods.sort_by_key(|m| m.as_str());
        methods
    }

    /// Value of the `Public` header for an OPTIONS request on `path`.
    pub fn public_header(&self, path: &str) -> String {
        self.allowed_methods(path)
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    /// Enable or disable the per-request access log.
    pub fn set_logging(&mut self, enabled: bool) {
        self.logging = enabled;
    }

    pub fn access_log(&self) -> &Arc<dyn AccessLogSink> {
        &self.access_log
    }

    /// Replace the access log sink.
    pub fn set_access_log(&mut self, sink: Arc<dyn AccessLogSink>) {
        self.access_log = sink;
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    /// Set the `Access-Control-Allow-Origin` value stamped on every response.
    pub fn set_allow_origin(&mut self, origin: &str) -> Result<(), InvalidHeaderValue> {
        self.allow_origin = HeaderValue::from_str(origin)?;
        Ok(())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("logging", &self.logging)
            .field("allow_origin", &self.allow_origin)
            .finish_non_exhaustive()
    }
}
