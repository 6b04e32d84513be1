//! Transport layer.
//!
//! One logical execution endpoint served over HTTP GET/POST (with CORS and
//! preflight handling) and a WebSocket upgrade for subscriptions, plus the
//! explorer page.

pub mod codec;
pub mod cors;
pub mod explorer;
pub mod http;
pub mod ws;

use axum::http::{header::HeaderName, HeaderMap};

/// Header value as str; non-UTF-8 values count as absent.
pub(crate) fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
