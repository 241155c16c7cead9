//! Per-request access log.
//!
//! # Format
//! ```text
//! <addr> - - [<time>] "<method> <path> <proto>" <status> <size> "<referer>" "<agent>"
//! ```
//! Modeled after the nginx/Apache combined log format so existing log
//! scrapers can parse it.
//!
//! # Design Decisions
//! - One line per request, emitted after the response is finalized
//! - Sinks are shared across request tasks and must tolerate concurrent use

use std::fmt;
use std::io::Write;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use chrono::{DateTime, Local};

use crate::http::request::decode_path;
use crate::http::response::DeliveryStatus;

/// Timestamp layout inside the brackets.
pub const TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Destination for access log lines.
pub trait AccessLogSink: Send + Sync {
    fn record(&self, entry: &AccessLogEntry);
}

/// Emits each line as an `info` event on target `route_mux::access`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessLog;

impl AccessLogSink for TracingAccessLog {
    fn record(&self, entry: &AccessLogEntry) {
        tracing::info!(target: "route_mux::access", "{}", entry);
    }
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutAccessLog;

impl AccessLogSink for StdoutAccessLog {
    fn record(&self, entry: &AccessLogEntry) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", entry) {
            tracing::warn!(error = %e, "Failed to write access log line");
        }
    }
}

/// Request fields captured before the handler takes ownership of it.
///
/// `path` is percent-decoded, the same form the route table matches on.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub remote_addr: Option<SocketAddr>,
    pub method: String,
    pub path: String,
    pub proto: String,
    pub referer: String,
    pub user_agent: String,
}

impl RequestSummary {
    pub fn capture<B>(req: &Request<B>) -> Self {
        let header_str = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        Self {
            remote_addr: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            method: req.method().to_string(),
            path: decode_path(req.uri().path()),
            proto: format!("{:?}", req.version()),
            referer: header_str(header::REFERER),
            user_agent: header_str(header::USER_AGENT),
        }
    }
}

/// One access log line.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub request: RequestSummary,
    pub time: DateTime<Local>,
    pub status: u16,
    pub size: usize,
}

impl AccessLogEntry {
    pub fn new(request: RequestSummary, delivery: DeliveryStatus) -> Self {
        Self {
            request,
            time: Local::now(),
            status: delivery.status,
            size: delivery.size,
        }
    }
}

impl fmt::Display for AccessLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let req = &self.request;
        match req.remote_addr {
            Some(addr) => write!(f, "{addr}")?,
            None => f.write_str("-")?,
        }
        write!(
            f,
            " - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
            self.time.format(TIME_FORMAT),
            req.method,
            req.path,
            req.proto,
            self.status,
            self.size,
            req.referer,
            req.user_agent,
        )
    }
}
