//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeouts, graceful shutdown)
//!     → dispatch.rs (route scan, handler, OPTIONS, 404, access log)
//!     → request.rs (path params merged into the query string)
//!     → response.rs (wrapper stamps headers, buffer builds the response)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use dispatch::Dispatcher;
pub use negotiate::{serve_formatted, serve_json, serve_xml};
pub use request::{PathParams, QueryValues, RequestParamsExt};
pub use response::{http_error, not_found, ResponseWriter};
pub use server::HttpServer;
