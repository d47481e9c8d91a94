//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Extract routing-relevant information (host, path)
//! - Rewrite the request path while keeping the query string
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept, not replaced

use axum::body::Body;
use axum::http::{header, uri::PathAndQuery, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The request ID assigned by the request-id layer, if any.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Host the client addressed: the Host header, or the URI authority for HTTP/2.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .filter(|h| !h.is_empty())
}

/// A path whose last segment has a non-page extension (`.css`, `.png`, ...).
pub fn is_static_resource(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(_) => !ends_with_html(last),
        None => false,
    }
}

/// Case-insensitive `.html` suffix check.
pub fn ends_with_html(segment: &str) -> bool {
    segment.len() >= 5
        && segment.is_char_boundary(segment.len() - 5)
        && segment[segment.len() - 5..].eq_ignore_ascii_case(".html")
}

/// Replace the request path, keeping the query string.
pub fn rewrite_path(request: &mut Request<Body>, new_path: &str) -> Result<(), axum::http::Error> {
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", new_path, query),
        None => new_path.to_string(),
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    *request.uri_mut() = Uri::from_parts(parts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resource_detection() {
        assert!(is_static_resource("/css/site.css"));
        assert!(is_static_resource("/en/img/logo.PNG"));
        assert!(!is_static_resource("/en/about.html"));
        assert!(!is_static_resource("/en/About.HTML"));
        assert!(!is_static_resource("/en/about"));
        assert!(!is_static_resource("/"));
    }

    #[test]
    fn test_request_host_prefers_header() {
        let req = Request::builder()
            .uri("http://uri.example/en")
            .header("Host", "header.example")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("header.example"));

        let req = Request::builder()
            .uri("http://uri.example:8080/en")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("uri.example:8080"));

        let req = Request::builder().uri("/en").body(Body::empty()).unwrap();
        assert_eq!(request_host(&req), None);
    }

    #[test]
    fn test_rewrite_path_keeps_query() {
        let mut req = Request::builder()
            .uri("/en/about.html?RefreshCache=true")
            .body(Body::empty())
            .unwrap();
        rewrite_path(&mut req, "/en/about").unwrap();
        assert_eq!(req.uri().path(), "/en/about");
        assert_eq!(req.uri().query(), Some("RefreshCache=true"));
    }

    #[test]
    fn test_make_request_id() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = UuidRequestId.make_request_id(&req).unwrap();
        assert_eq!(id.header_value().len(), 36);
    }
}
