//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single request entry point
//! - Wire up middleware (tracing, request ID, timeout, locale, page cache)
//! - Bind server to listener
//! - Dispatch requests through the route table to the matched endpoint
//! - Apply reloaded configuration without dropping requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::{request_host, request_id, UuidRequestId};
use crate::http::response::plain;
use crate::lifecycle::startup::{build_state, StartupError};
use crate::locale::{locale_middleware, LocaleTable};
use crate::observability::metrics;
use crate::pages::{page_cache_middleware, PageCacheState};
use crate::render::{builtin_controllers, ControllerRegistry, FileViewEngine, ViewEngine};
use crate::routing::{EndpointDataSource, EndpointMatcher, MatchContext, RouteTableError};
use crate::tenants::{TenantError, TenantRegistry, TenantSet};

/// Application state injected into the entry point.
#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<TenantRegistry>,
    pub locales: Arc<LocaleTable>,
    pub data_source: Arc<EndpointDataSource>,
    pub matcher: Arc<EndpointMatcher>,
    pub page_cache: Arc<PageCacheState>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("invalid tenants: {0}")]
    Tenant(#[from] TenantError),

    #[error("route table rebuild failed: {0}")]
    RouteTable(#[from] RouteTableError),
}

impl AppState {
    /// Publish new tenants and their routes.
    ///
    /// The route table is swapped first; the registry follows only if that
    /// succeeded, so a failed reload leaves both untouched. Endpoints carry
    /// their tenant, so dispatch never depends on the registry catching up.
    /// Between the two swaps a newly added host bypasses the page cache.
    pub async fn apply_config(&self, config: &AppConfig) -> Result<(), ReloadError> {
        let tenants = Arc::new(TenantSet::from_config(&config.tenants)?);
        let table = self.data_source.reload(&tenants, &config.route_templates).await?;
        self.tenants.replace(tenants);

        tracing::info!(
            tenants = self.tenants.snapshot().len(),
            endpoints = table.len(),
            generation = table.generation(),
            "Configuration applied"
        );
        Ok(())
    }
}

/// HTTP server for the multi-tenant front.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server with the built-in controllers and file-backed views.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let views = Arc::new(FileViewEngine::new(config.views.root.clone()));
        Self::with_components(config, builtin_controllers(), views)
    }

    pub fn with_components(
        config: AppConfig,
        controllers: ControllerRegistry,
        views: Arc<dyn ViewEngine>,
    ) -> Result<Self, StartupError> {
        let state = build_state(&config, controllers, views)?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .fallback(route_request)
            .with_state(state.clone());

        if config.page_cache.enabled {
            router = router.layer(middleware::from_fn_with_state(
                state.page_cache.clone(),
                page_cache_middleware,
            ));
        }

        router
            .layer(middleware::from_fn_with_state(state.locales.clone(), locale_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_requests))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, applying configs from `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = state.apply_config(&config).await {
                    tracing::error!(error = %e, "Configuration reload rejected, keeping current configuration");
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Shared request entry point: route table lookup, host filter, endpoint handler.
async fn route_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let table = match state.data_source.endpoints() {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(request_id = %request_id(&request), error = %e, "Route table unavailable");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "Route table unavailable");
        }
    };

    let matched = {
        let context = MatchContext {
            path: request.uri().path(),
            host: request_host(&request),
        };
        state.matcher.match_request(&table, &context)
    };

    match matched {
        Some(route) => {
            tracing::debug!(
                request_id = %request_id(&request),
                endpoint = %route.endpoint.display_name(),
                generation = table.generation(),
                "Route matched"
            );
            route.endpoint.handler().handle(request, route).await
        }
        None => {
            tracing::debug!(
                request_id = %request_id(&request),
                path = %request.uri().path(),
                host = ?request_host(&request),
                "No route matched"
            );
            plain(StatusCode::NOT_FOUND, "No matching route found")
        }
    }
}

async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenantConfig;
    use tower::ServiceExt;

    fn config(hosts: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.page_cache.enabled = false;
        config.tenants = hosts
            .iter()
            .map(|host| TenantConfig {
                name: host.to_string(),
                identifier: host.to_string(),
                short_identifier: host.to_string(),
                host: host.to_string(),
            })
            .collect();
        config
    }

    async fn get(router: &Router, host: &str, uri: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header("Host", host)
            .body(Body::empty())
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_host_is_not_found() {
        let server = HttpServer::new(config(&["a.example"])).unwrap();
        let response = get(&server.router(), "other.example", "/en/home/index").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_apply_config_swaps_tenants() {
        let server = HttpServer::new(config(&["a.example"])).unwrap();
        let router = server.router();

        server.state().apply_config(&config(&["b.example"])).await.unwrap();
        assert!(server.state().tenants.contains("b.example"));
        assert!(!server.state().tenants.contains("a.example"));

        let response = get(&router, "a.example", "/en/nope/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"No matching route found");
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_previous_config() {
        let server = HttpServer::new(config(&["a.example"])).unwrap();
        let before = server.state().data_source.endpoints().unwrap();

        let err = server
            .state()
            .apply_config(&config(&["dup.example", "DUP.example"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReloadError::Tenant(_)));

        let after = server.state().data_source.endpoints().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(server.state().tenants.contains("a.example"));
    }
}
