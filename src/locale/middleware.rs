//! Locale middleware: applies the resolver's decision to GET page requests.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::is_static_resource;
use crate::http::response::moved_permanently;
use crate::locale::resolver::{resolve, LocaleDecision};
use crate::locale::table::LocaleTable;
use crate::observability::metrics;

/// Locale resolved for the current request, lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub String);

pub async fn locale_middleware(
    State(locales): State<Arc<LocaleTable>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET || is_static_resource(request.uri().path()) {
        return next.run(request).await;
    }

    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let decision = resolve(
        &locales,
        request.uri().path(),
        request.uri().query(),
        accept_language,
    );

    match decision {
        LocaleDecision::Redirect(location) => {
            tracing::debug!(path = %request.uri().path(), location = %location, "Locale redirect");
            metrics::record_redirect("locale");
            moved_permanently(&location)
        }
        LocaleDecision::Resolved(code) => {
            tracing::trace!(locale = %code, "Locale resolved");
            request.extensions_mut().insert(RequestLocale(code));
            next.run(request).await
        }
    }
}
