//! Page cache middleware: serve cached pages, canonicalize page URLs, and
//! write freshly rendered pages back to disk.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::PageCacheConfig;
use crate::http::request::{ends_with_html, request_host, request_id, rewrite_path};
use crate::http::response::{html, is_html, moved_permanently, plain};
use crate::locale::RequestLocale;
use crate::observability::metrics;
use crate::pages::cache::PageCache;
use crate::pages::generate::{BatchRequest, GenerateMode, PageGeneration, PageWritten};
use crate::tenants::TenantRegistry;

const REFRESH_CACHE: &str = "RefreshCache";

/// Shared state for [`page_cache_middleware`].
#[derive(Debug)]
pub struct PageCacheState {
    cache: PageCache,
    tenants: Arc<TenantRegistry>,
    auto_generate: bool,
    max_body_bytes: usize,
}

impl PageCacheState {
    pub fn new(config: &PageCacheConfig, tenants: Arc<TenantRegistry>) -> Self {
        Self {
            cache: PageCache::new(config.root()),
            tenants,
            auto_generate: config.auto_generate,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }
}

pub async fn page_cache_middleware(
    State(state): State<Arc<PageCacheState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }
    let known_tenant = request_host(&request).is_some_and(|host| state.tenants.contains(host));
    if !known_tenant {
        return next.run(request).await;
    }

    let lang = request
        .extensions()
        .get::<RequestLocale>()
        .map(|l| l.0.clone())
        .unwrap_or_default();
    let path = request.uri().path().to_string();
    let segments = page_segments(&path, &lang);
    let last = segments.last().map(String::as_str);

    if !can_process(last) {
        return next.run(request).await;
    }

    let batch = request.extensions().get::<BatchRequest>().is_some();
    if batch || refresh_requested(request.uri().query()) {
        let mode = if batch {
            GenerateMode::BatchGenerating
        } else {
            GenerateMode::ForceGenerating
        };
        let key_path = match last {
            Some(last) if ends_with_html(last) => path.clone(),
            _ => canonical_page_path(&lang, &segments),
        };
        return generate(&state, request, next, mode, &key_path, &lang, &segments).await;
    }

    let Some(last) = last else {
        return redirect(&canonical_page_path(&lang, &segments));
    };
    if !ends_with_html(last) {
        return redirect(&canonical_page_path(&lang, &segments));
    }

    let cache_file = match state.cache.cache_file_path(&path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(request_id = %request_id(&request), path = %path, error = %e, "Rejected page path");
            return plain(StatusCode::BAD_REQUEST, "Invalid page path");
        }
    };

    match state.cache.read(&cache_file).await {
        Ok(Some(content)) => {
            metrics::record_cache_lookup("hit");
            tracing::debug!(path = %path, file = %cache_file.display(), "Page cache hit");
            return html(content);
        }
        Ok(None) => metrics::record_cache_lookup("miss"),
        Err(e) => {
            metrics::record_cache_lookup("error");
            tracing::warn!(
                request_id = %request_id(&request),
                file = %cache_file.display(),
                error = %e,
                "Failed to read cached page, regenerating"
            );
        }
    }

    if !state.auto_generate {
        return plain(StatusCode::NOT_FOUND, "Page not found");
    }

    rewrite_and_run(&state, request, next, GenerateMode::AutoGenerating, cache_file, &lang, &segments).await
}

async fn generate(
    state: &PageCacheState,
    request: Request<Body>,
    next: Next,
    mode: GenerateMode,
    key_path: &str,
    lang: &str,
    segments: &[String],
) -> Response {
    match state.cache.cache_file_path(key_path) {
        Ok(cache_file) => rewrite_and_run(state, request, next, mode, cache_file, lang, segments).await,
        Err(e) => {
            tracing::warn!(request_id = %request_id(&request), path = %key_path, error = %e, "Rejected page path");
            plain(StatusCode::BAD_REQUEST, "Invalid page path")
        }
    }
}

/// Tag the request for generation, route it extensionless, and write the
/// rendered page back.
async fn rewrite_and_run(
    state: &PageCacheState,
    mut request: Request<Body>,
    next: Next,
    mode: GenerateMode,
    cache_file: PathBuf,
    lang: &str,
    segments: &[String],
) -> Response {
    if let Some(routed) = extensionless_path(lang, segments) {
        if let Err(e) = rewrite_path(&mut request, &routed) {
            tracing::warn!(path = %routed, error = %e, "Failed to rewrite page path");
            return plain(StatusCode::BAD_REQUEST, "Invalid page path");
        }
    }

    tracing::debug!(
        request_id = %request_id(&request),
        mode = mode.as_str(),
        file = %cache_file.display(),
        "Generating page"
    );
    request.extensions_mut().insert(PageGeneration {
        mode,
        cache_file: cache_file.clone(),
    });

    let response = next.run(request).await;
    write_back(state, response, cache_file, mode).await
}

async fn write_back(
    state: &PageCacheState,
    response: Response,
    cache_file: PathBuf,
    mode: GenerateMode,
) -> Response {
    if response.status() != StatusCode::OK || !is_html(&response) {
        tracing::debug!(status = %response.status(), mode = mode.as_str(), "Rendered page not cacheable");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(file = %cache_file.display(), error = %e, "Failed to buffer rendered page");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page");
        }
    };

    match state.cache.write(&cache_file, &bytes).await {
        Ok(()) => {
            metrics::record_cache_write("ok");
            tracing::info!(file = %cache_file.display(), mode = mode.as_str(), "Page written to cache");
            parts.extensions.insert(PageWritten(cache_file));
        }
        Err(e) => {
            metrics::record_cache_write("failed");
            tracing::warn!(file = %cache_file.display(), error = %e, "Failed to write cached page");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn redirect(location: &str) -> Response {
    metrics::record_redirect("canonical");
    moved_permanently(location)
}

/// Path segments after the locale segment.
fn page_segments(path: &str, lang: &str) -> Vec<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if !lang.is_empty() && segments.peek().is_some_and(|first| first.eq_ignore_ascii_case(lang)) {
        segments.next();
    }
    segments.map(str::to_string).collect()
}

/// Pages are extensionless or `.html`; anything else is left alone.
fn can_process(last: Option<&str>) -> bool {
    match last {
        None => true,
        Some(segment) => match segment.find('.') {
            None => true,
            Some(dot) => dot > 0 && ends_with_html(segment),
        },
    }
}

fn refresh_requested(query: Option<&str>) -> bool {
    let Some(query) = query else {
        return false;
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| key.eq_ignore_ascii_case(REFRESH_CACHE))
        .is_some_and(|(_, value)| value.trim().eq_ignore_ascii_case("true"))
}

/// The canonical `.html` URL of a page.
fn canonical_page_path(lang: &str, segments: &[String]) -> String {
    if segments.is_empty() {
        return join(lang, &["index.html".to_string()]);
    }
    let lowered: Vec<String> = segments.iter().map(|s| s.to_lowercase()).collect();
    format!("{}.html", join(lang, &lowered))
}

/// The path routing sees for a `.html` page: `index.html` maps to its folder,
/// everything else loses the suffix. `None` when there is nothing to strip.
fn extensionless_path(lang: &str, segments: &[String]) -> Option<String> {
    let last = segments.last()?;
    if !ends_with_html(last) {
        return None;
    }

    let mut lowered: Vec<String> = segments.iter().map(|s| s.to_lowercase()).collect();
    let stem = lowered.pop().unwrap_or_default();
    if stem != "index.html" {
        lowered.push(stem[..stem.len() - ".html".len()].to_string());
    }
    Some(join(lang, &lowered))
}

fn join(lang: &str, segments: &[String]) -> String {
    let mut path = String::new();
    for segment in std::iter::once(lang).chain(segments.iter().map(String::as_str)) {
        if !segment.is_empty() {
            path.push('/');
            path.push_str(segment);
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
