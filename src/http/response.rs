//! Response writing and observation.
//!
//! # Responsibilities
//! - Define the capability set handlers write responses through
//! - Buffer a response until the dispatcher hands it to the host
//! - Observe whether a handler produced any output
//! - Stamp `Content-Length` and `Access-Control-Allow-Origin` on writes
//!
//! # Design Decisions
//! - `ResponseWrapper` forwards every call to the sink it wraps and only
//!   records state; it never buffers by itself
//! - The status line is committed by the first write or status set, headers
//!   stay editable until the response is finalized
//! - `started` never goes back to false within one exchange

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Response, StatusCode};

/// Capability set for writing a response.
pub trait ResponseWriter: Send {
    /// Headers that will be sent with the response.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Append bytes to the body, returning how many were written.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Set the response status.
    fn write_status(&mut self, status: StatusCode);
}

/// In-memory response sink.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            committed: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finalize into a response. `Content-Length` reflects the buffered body.
    pub fn into_response(self) -> Response<Body> {
        let Self {
            status,
            mut headers,
            body,
            ..
        } = self;

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.committed = true;
        self.body.extend_from_slice(bytes);
        bytes.len()
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.committed {
            tracing::debug!(
                current = %self.status,
                ignored = %status,
                "Superfluous status write"
            );
            return;
        }
        self.committed = true;
        self.status = status;
    }
}

/// Final state of a response wrapper after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStatus {
    /// Whether anything was written or a status was set.
    pub started: bool,
    /// Last status set, 200 when only a body was written, 0 when nothing was.
    pub status: u16,
    /// Body bytes written.
    pub size: usize,
}

/// Observing adapter around a response sink.
///
/// Tracks whether a response was started, its status and size, and stamps
/// `Content-Length` and `Access-Control-Allow-Origin` on every write.
#[derive(Debug)]
pub struct ResponseWrapper<W> {
    inner: W,
    allow_origin: HeaderValue,
    started: bool,
    size: usize,
    status: Option<StatusCode>,
}

impl<W: ResponseWriter> ResponseWrapper<W> {
    pub fn new(inner: W, allow_origin: HeaderValue) -> Self {
        Self {
            inner,
            allow_origin,
            started: false,
            size: 0,
            status: None,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn delivery(&self) -> DeliveryStatus {
        let status = match (self.status, self.started) {
            (Some(status), _) => status.as_u16(),
            (None, true) => StatusCode::OK.as_u16(),
            (None, false) => 0,
        };
        DeliveryStatus {
            started: self.started,
            status,
            size: self.size,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn stamp(&mut self, content_length: usize) {
        let headers = self.inner.headers_mut();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin.clone(),
        );
    }
}

impl<W: ResponseWriter> ResponseWriter for ResponseWrapper<W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.size += bytes.len();
        self.started = true;
        self.stamp(self.size);
        self.inner.write(bytes)
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.started = true;
        self.stamp(0);
        self.inner.write_status(status);
    }
}

/// Reply with `message` as plain text and the given status.
pub fn http_error(w: &mut dyn ResponseWriter, message: &str, status: StatusCode) {
    let headers = w.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    w.write_status(status);
    w.write(format!("{message}\n").as_bytes());
}

/// Reply with the standard 404 page.
pub fn not_found(w: &mut dyn ResponseWriter) {
    http_error(w, "404 page not found", StatusCode::NOT_FOUND);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapper() -> ResponseWrapper<ResponseBuffer> {
        ResponseWrapper::new(ResponseBuffer::new(), HeaderValue::from_static("*"))
    }

    #[test]
    fn test_fresh_wrapper_has_not_started() {
        let w = wrapper();
        assert!(!w.started());
        assert_eq!(
            w.delivery(),
            DeliveryStatus { started: false, status: 0, size: 0 }
        );
    }

    #[test]
    fn test_write_stamps_headers() {
        let mut w = wrapper();
        assert_eq!(w.write(b"hello"), 5);

        assert!(w.started());
        assert_eq!(w.size(), 5);
        assert_eq!(w.headers()[header::CONTENT_LENGTH], "5");
        assert_eq!(w.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(w.delivery().status, 200);
    }

    #[test]
    fn test_write_status_stamps_headers() {
        let mut w = ResponseWrapper::new(
            ResponseBuffer::new(),
            HeaderValue::from_static("https://app.example"),
        );
        w.write_status(StatusCode::NO_CONTENT);

        assert!(w.started());
        assert_eq!(w.status(), Some(StatusCode::NO_CONTENT));
        assert_eq!(w.headers()[header::CONTENT_LENGTH], "0");
        assert_eq!(
            w.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );
    }

    #[test]
    fn test_started_is_never_reset() {
        let mut w = wrapper();
        w.write_status(StatusCode::ACCEPTED);
        w.write(b"");
        w.headers_mut().remove(header::CONTENT_LENGTH);
        assert!(w.started());
    }

    #[test]
    fn test_buffer_commits_first_status() {
        let mut buf = ResponseBuffer::new();
        buf.write(b"body");
        buf.write_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(buf.status(), StatusCode::OK);

        let mut buf = ResponseBuffer::new();
        buf.write_status(StatusCode::CREATED);
        buf.write_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(buf.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_into_response_uses_buffered_length() {
        let mut w = wrapper();
        w.write_status(StatusCode::OK);
        w.write(b"abc");
        w.write(b"de");

        let response = w.into_inner().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
    }

    #[test]
    fn test_not_found_page() {
        let mut w = wrapper();
        not_found(&mut w);

        assert!(w.started());
        assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            w.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let buf = w.into_inner();
        assert_eq!(buf.body(), b"404 page not found\n");
    }
}
