//! Request query handling.
//!
//! # Responsibilities
//! - Parse and encode `application/x-www-form-urlencoded` query strings
//! - Merge captured path parameters into the request's query string
//! - Give handlers one lookup surface for path and query parameters
//! - Keep the route's own captures apart from client-supplied query values
//!
//! # Design Decisions
//! - Path parameters are appended next to same-named query values, never
//!   replacing them
//! - The captures are also stored as a [`PathParams`] extension; code that
//!   must trust the matched path (static mounts) reads them from there
//! - Encoding sorts keys, so a rewritten query string is deterministic

use std::collections::BTreeMap;

use axum::http::uri::{PathAndQuery, Uri};
use axum::http::Request;
use url::form_urlencoded;

use crate::routing::pattern::ParameterMap;

/// Multi-valued query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut values = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values.add(key, value);
        }
        values
    }

    /// Append a value to `key`, keeping any existing values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode as a query string, keys sorted.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.values {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// Values captured from the request path by the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.push((name.into(), value.into()));
    }

    /// Captured value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parameter access for handlers.
pub trait RequestParamsExt {
    /// Parsed query string, including merged path parameters.
    fn query_values(&self) -> QueryValues;

    /// First value of a path or query parameter.
    fn param(&self, name: &str) -> Option<String> {
        self.query_values().get(name).map(str::to_string)
    }

    /// All values of a path or query parameter.
    fn params(&self, name: &str) -> Vec<String> {
        self.query_values().get_all(name).to_vec()
    }

    /// Value captured from the path only; query values are ignored.
    fn path_param(&self, name: &str) -> Option<String>;
}

impl<B> RequestParamsExt for Request<B> {
    fn query_values(&self) -> QueryValues {
        QueryValues::parse(self.uri().query().unwrap_or_default())
    }

    fn path_param(&self, name: &str) -> Option<String> {
        self.extensions()
            .get::<PathParams>()
            .and_then(|p| p.get(name))
            .map(str::to_string)
    }
}

/// Percent-decode a request path; falls back to the raw path.
pub fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Merge captured path values into the request's query string.
///
/// `captures[i]` is stored under the name at position `i` of `names`.
pub fn inject_params<B>(req: &mut Request<B>, names: &ParameterMap, captures: &[&str]) {
    let mut values = req.query_values();
    let mut path_params = PathParams::new();
    for (position, value) in captures.iter().enumerate() {
        let Some(name) = names.name(position) else {
            continue;
        };
        values.add(name, *value);
        path_params.push(name, *value);
    }
    req.extensions_mut().insert(path_params);

    match with_query(req.uri(), &values.encode()) {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => {
            tracing::warn!(uri = %req.uri(), error = %e, "Failed to rebuild request URI");
        }
    }
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, axum::http::Error> {
    let path = uri.path();
    let path_and_query = if query.is_empty() {
        PathAndQuery::try_from(path)?
    } else {
        PathAndQuery::try_from(format!("{path}?{query}"))?
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern;
    use axum::body::Body;

    #[test]
    fn test_parse_multi_valued() {
        let values = QueryValues::parse("a=1&b=two+words&a=3&c=%2Fslash");
        assert_eq!(values.get_all("a"), ["1", "3"]);
        assert_eq!(values.get("b"), Some("two words"));
        assert_eq!(values.get("c"), Some("/slash"));
        assert_eq!(values.get("missing"), None);
        assert!(values.get_all("missing").is_empty());
    }

    #[test]
    fn test_encode_sorts_keys() {
        let mut values = QueryValues::new();
        values.add("z", "last");
        values.add("a", "first one");
        values.add("a", "&second");
        assert_eq!(values.encode(), "a=first+one&a=%26second&z=last");
    }

    #[test]
    fn test_inject_appends_to_existing_values() {
        let (_, names) = pattern::compile("/user/:id").unwrap();
        let mut req = Request::builder()
            .uri("http://localhost/user/42?id=7&sort=asc")
            .body(Body::empty())
            .unwrap();

        inject_params(&mut req, &names, &["42"]);

        assert_eq!(req.uri().path(), "/user/42");
        assert_eq!(req.uri().query(), Some("id=7&id=42&sort=asc"));
        assert_eq!(req.params("id"), vec!["7", "42"]);
        assert_eq!(req.param("sort").as_deref(), Some("asc"));
    }

    #[test]
    fn test_path_param_ignores_query_values() {
        let (_, names) = pattern::compile("/files/:filepath(.+)").unwrap();
        let mut req = Request::builder()
            .uri("/files/a.txt?filepath=b.txt")
            .body(Body::empty())
            .unwrap();

        assert_eq!(req.path_param("filepath"), None);
        inject_params(&mut req, &names, &["a.txt"]);

        assert_eq!(req.param("filepath").as_deref(), Some("b.txt"));
        assert_eq!(req.path_param("filepath").as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/tag/hello%20world"), "/tag/hello world");
        assert_eq!(decode_path("/files/%2e%2e/x"), "/files/../x");
        assert_eq!(decode_path("/bad/%ff"), "/bad/%ff");
    }

    #[test]
    fn test_inject_into_request_without_query() {
        let (_, names) = pattern::compile("/:a/:b").unwrap();
        let mut req = Request::builder()
            .uri("/x/hello%20world")
            .body(Body::empty())
            .unwrap();

        inject_params(&mut req, &names, &["x", "hello world"]);

        assert_eq!(req.param("a").as_deref(), Some("x"));
        assert_eq!(req.param("b").as_deref(), Some("hello world"));
        assert_eq!(req.uri().query(), Some("a=x&b=hello+world"));
    }

    #[test]
    fn test_no_params_keeps_path() {
        let names = ParameterMap::default();
        let mut req = Request::builder().uri("/plain").body(()).unwrap();
        inject_params(&mut req, &names, &[]);
        assert_eq!(req.uri(), "/plain");
    }
}
