//! Static file serving for directory mounts.
//!
//! The route captures everything after the mount prefix as the `filepath`
//! parameter. That remainder is cleaned as a rooted path before it is
//! joined to the mount directory; file I/O is delegated to `tower-http`.
//!
//! Only the path capture names the file. A `filepath` query value sent by
//! the client is left to handlers and never consulted here.
//!
//! Handlers write into a buffered sink, so a file is read into memory
//! before it is sent. Files larger than [`MAX_FILE_BYTES`] are refused with
//! a 500 instead of growing the buffer without bound.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::request::RequestParamsExt;
use crate::http::response::{http_error, not_found, ResponseWriter};

/// Parameter holding the path below a static mount.
pub const FILEPATH_PARAM: &str = "filepath";

/// Largest file a static mount will buffer.
pub const MAX_FILE_BYTES: usize = 32 * 1024 * 1024;

/// Lexically clean `path` as an absolute path.
///
/// Collapses repeated slashes, drops `.` segments and resolves `..`
/// against the preceding segment. `..` at the root stays at the root.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Join a requested path to `root` without leaving it.
pub fn resolve(root: &Path, requested: &str) -> PathBuf {
    let cleaned = clean_path(requested);
    let relative = cleaned.trim_start_matches('/');
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Serve the file named by the `filepath` path capture from `root`.
pub async fn serve(root: &Path, req: Request<Body>, w: &mut dyn ResponseWriter) {
    serve_limited(root, req, w, MAX_FILE_BYTES).await
}

async fn serve_limited(
    root: &Path,
    req: Request<Body>,
    w: &mut dyn ResponseWriter,
    limit: usize,
) {
    let requested = req.path_param(FILEPATH_PARAM).unwrap_or_default();
    let path = resolve(root, &requested);

    tracing::debug!(path = %path.display(), "Serving static file");

    let response = match ServeFile::new(&path).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(Body::new(body), limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), limit, error = %e, "Failed to read static file");
            http_error(w, "failed to read file", StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }
    };

    if parts.status == StatusCode::NOT_FOUND {
        not_found(w);
        return;
    }

    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_LENGTH {
            w.headers_mut().insert(name.clone(), value.clone());
        }
    }
    w.write_status(parts.status);
    if !bytes.is_empty() {
        w.write(&bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::PathParams;
    use crate::http::response::{ResponseBuffer, ResponseWrapper};
    use axum::http::HeaderValue;

    fn file_request(uri: &str, filepath: &str) -> Request<Body> {
        let mut params = PathParams::new();
        params.push(FILEPATH_PARAM, filepath);
        Request::builder()
            .uri(uri)
            .extension(params)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("a/b/c"), "/a/b/c");
        assert_eq!(clean_path("/a//b/./c/"), "/a/b/c");
        assert_eq!(clean_path("a/b/../c"), "/a/c");
        assert_eq!(clean_path("../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("/../.."), "/");
    }

    #[test]
    fn test_resolve_never_escapes_root() {
        let root = Path::new("/srv/public");
        for requested in [
            "../../etc/passwd",
            "css/../../../../etc/passwd",
            "./..",
            "a/../../b",
        ] {
            let path = resolve(root, requested);
            assert!(path.starts_with(root), "{requested} escaped to {path:?}");
        }
        assert_eq!(
            resolve(root, "../../etc/passwd"),
            PathBuf::from("/srv/public/etc/passwd")
        );
        assert_eq!(resolve(root, "css/site.css"), root.join("css/site.css"));
    }

    #[tokio::test]
    async fn test_serve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hi there").unwrap();

        let req = file_request("/files/hello.txt", "hello.txt");
        let mut w = ResponseWrapper::new(ResponseBuffer::new(), HeaderValue::from_static("*"));
        serve(dir.path(), req, &mut w).await;

        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.size(), 8);
        let content_type = w.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(w.into_inner().body(), b"hi there");
    }

    #[tokio::test]
    async fn test_serve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let req = file_request("/files/nope.txt", "nope.txt");
        let mut w = ResponseWrapper::new(ResponseBuffer::new(), HeaderValue::from_static("*"));
        serve(dir.path(), req, &mut w).await;

        assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(w.into_inner().body(), b"404 page not found\n");
    }

    #[tokio::test]
    async fn test_query_value_does_not_pick_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "AAA").unwrap();
        std::fs::write(dir.path().join("b.txt"), "BBB").unwrap();

        let req = file_request("/files/a.txt?filepath=b.txt", "a.txt");
        let mut w = ResponseWrapper::new(ResponseBuffer::new(), HeaderValue::from_static("*"));
        serve(dir.path(), req, &mut w).await;

        assert_eq!(w.into_inner().body(), b"AAA");
    }

    #[tokio::test]
    async fn test_file_over_limit_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.bin"), [0u8; 64]).unwrap();

        let req = file_request("/files/big.bin", "big.bin");
        let mut w = ResponseWrapper::new(ResponseBuffer::new(), HeaderValue::from_static("*"));
        serve_limited(dir.path(), req, &mut w, 16).await;

        assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(w.into_inner().body(), b"failed to read file\n");
    }
}
