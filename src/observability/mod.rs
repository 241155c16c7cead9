//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured `tracing` events)
//!
//! Dispatcher produces, once per request:
//!     → access_log.rs (combined-format line → sink)
//! ```
//!
//! # Design Decisions
//! - Structured logging (pretty or JSON) for process events
//! - Access log keeps a fixed line format for log scrapers

pub mod access_log;
pub mod logging;

pub use access_log::{AccessLogEntry, AccessLogSink, StdoutAccessLog, TracingAccessLog};
