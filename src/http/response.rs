//! Response helpers.
//!
//! # Responsibilities
//! - Build redirect, cached-page and plain-text error responses
//!
//! # Design Decisions
//! - Canonicalization redirects are permanent (301), never 308
//! - Error bodies are short plain text

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

pub const TEXT_HTML: &str = "text/html";

/// 301 with a `Location` header.
pub fn moved_permanently(location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            (StatusCode::BAD_REQUEST, "Invalid redirect target").into_response()
        }
    }
}

/// 200 `text/html` page body.
pub fn html(body: impl Into<Body>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML))],
        body.into(),
    )
        .into_response()
}

/// Plain-text error response.
pub fn plain(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}

/// True for responses carrying a `text/html` body.
pub fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with(TEXT_HTML))
}
