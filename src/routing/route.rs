//! Route records.
//!
//! A route pairs a method and a compiled pattern with the handler that
//! serves it. Routes are immutable once built and owned by the [`Router`]
//! that registered them.
//!
//! [`Router`]: crate::routing::Router

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request};
use futures_util::future::BoxFuture;

use crate::http::response::ResponseWriter;
use crate::routing::pattern::{CompiledPattern, ParameterMap};

/// Request handler.
///
/// Receives the request (with path parameters already merged into its
/// query string) and the response writer for this exchange.
pub type Handler =
    Arc<dyn for<'w> Fn(Request<Body>, &'w mut dyn ResponseWriter) -> BoxFuture<'w, ()> + Send + Sync>;

/// HTTP methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Connect,
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Options,
        Method::Patch,
        Method::Post,
        Method::Put,
        Method::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Connect => "CONNECT",
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Trace => "TRACE",
        }
    }

    /// Exact comparison with a request method. HEAD does not match GET.
    pub fn matches(&self, method: &http::Method) -> bool {
        self.as_str() == method.as_str()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnknownMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

/// A registered route.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: CompiledPattern,
    params: ParameterMap,
    handler: Handler,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        pattern: CompiledPattern,
        params: ParameterMap,
        handler: Handler,
    ) -> Self {
        Self {
            method,
            pattern,
            params,
            handler,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn params(&self) -> &ParameterMap {
        &self.params
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
