//! Batch regeneration of cached pages through the full request pipeline.

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use crate::pages::generate::{BatchRequest, PageWritten};

/// Result of regenerating one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub path: String,
    pub status: StatusCode,
    /// Artifact written, if the page was rendered and persisted.
    pub written: Option<PathBuf>,
    /// `Location` of a redirect response.
    pub location: Option<String>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.written.is_some()
    }
}

/// Pushes synthetic GET requests for one tenant through a built router.
#[derive(Clone)]
pub struct BatchGenerator {
    router: Router,
}

impl BatchGenerator {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Regenerate `paths` (canonical `.html` form, locale prefixed) for `host`.
    pub async fn generate(&self, host: &str, paths: &[String]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let outcome = self.generate_one(host, path).await;
            match &outcome.written {
                Some(file) => tracing::info!(host = %host, path = %path, file = %file.display(), "Page regenerated"),
                None => tracing::warn!(host = %host, path = %path, status = %outcome.status, "Page not regenerated"),
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn generate_one(&self, host: &str, path: &str) -> BatchOutcome {
        let mut request = match Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, host)
            .body(Body::empty())
        {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Invalid batch path");
                return BatchOutcome {
                    path: path.to_string(),
                    status: StatusCode::BAD_REQUEST,
                    written: None,
                    location: None,
                };
            }
        };
        request.extensions_mut().insert(BatchRequest);

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        };

        BatchOutcome {
            path: path.to_string(),
            status: response.status(),
            written: response.extensions().get::<PageWritten>().map(|w| w.0.clone()),
            location: response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}
