//! Regex-based HTTP request router.
//!
//! Maps method + path to the first registered handler that matches,
//! merges path parameters into the query string, answers OPTIONS with the
//! methods a path supports, and falls back to 404 when nothing responds.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use http::{Dispatcher, HttpServer, RequestParamsExt, ResponseWriter};
pub use lifecycle::Shutdown;
pub use routing::{Method, Router};
