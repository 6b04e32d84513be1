//! CORS middleware for the execution endpoint.
//!
//! Evaluates the origin policy for plain HTTP, reflects the exact origin on
//! allow, and answers `OPTIONS` preflights itself without reaching any handler.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::policy::{Admission, TransportKind};
use crate::transport::header_str;

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub async fn cors(State(app): State<AppState>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let admission = app.origin_policy().admit(
        header_str(headers, header::ORIGIN),
        header_str(headers, header::HOST),
        TransportKind::Http,
    );
    let cors_origin = match admission {
        Admission::Proceed { cors_origin } => cors_origin,
        // Plain HTTP never rejects.
        Admission::Reject => None,
    };

    if request.method() == Method::OPTIONS {
        let mut resp = StatusCode::OK.into_response();
        apply_cors_headers(resp.headers_mut(), cors_origin.as_deref());
        return resp;
    }

    let mut resp = next.run(request).await;
    apply_cors_headers(resp.headers_mut(), cors_origin.as_deref());
    resp
}

/// Insert the permissive headers for `origin`. Nothing is written without an
/// origin to reflect.
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&str>) {
    let Some(origin) = origin else { return };
    let Ok(value) = HeaderValue::from_str(origin) else {
        tracing::debug!(%origin, "origin is not a valid header value");
        return;
    };
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}
