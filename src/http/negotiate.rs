//! Serialization helpers for handlers.
//!
//! Write a resource as JSON or XML, picking the format from the `Accept`
//! header. Serialization failures become a 500 carrying the error text.

use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use serde::Serialize;

use crate::http::response::{http_error, ResponseWriter};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_XML: &str = "text/xml";

/// Response formats a resource can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Pick the format for an `Accept` header value.
    ///
    /// The first recognized media type in the list wins; JSON otherwise.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return Format::Json;
        };

        accept
            .split(',')
            .filter_map(|item| item.split(';').next())
            .map(|media| media.trim().to_ascii_lowercase())
            .find_map(|media| match media.as_str() {
                APPLICATION_JSON => Some(Format::Json),
                APPLICATION_XML | TEXT_XML => Some(Format::Xml),
                _ => None,
            })
            .unwrap_or(Format::Json)
    }
}

/// Reply with a pretty-printed JSON representation of `value`.
pub fn serve_json<T: Serialize + ?Sized>(w: &mut dyn ResponseWriter, value: &T) {
    match serde_json::to_vec_pretty(value) {
        Ok(content) => {
            w.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(APPLICATION_JSON),
            );
            w.write(&content);
        }
        Err(e) => http_error(w, &e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Reply with an XML representation of `value`.
pub fn serve_xml<T: Serialize + ?Sized>(w: &mut dyn ResponseWriter, value: &T) {
    match quick_xml::se::to_string(value) {
        Ok(content) => {
            w.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/xml; charset=utf-8"),
            );
            w.write(content.as_bytes());
        }
        Err(e) => http_error(w, &e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Reply with `value` in the format the client asked for.
pub fn serve_formatted<T: Serialize + ?Sized>(
    w: &mut dyn ResponseWriter,
    accept: Option<&str>,
    value: &T,
) {
    match Format::from_accept(accept) {
        Format::Json => serve_json(w, value),
        Format::Xml => serve_xml(w, value),
    }
}
