//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use domain_front::config::{AppConfig, TenantConfig};
use domain_front::render::{builtin_controllers, FileViewEngine, ViewEngine, ViewError};
use domain_front::routing::BoxFuture;
use domain_front::tenants::Tenant;
use domain_front::HttpServer;

pub const ALPHA: &str = "alpha.example";
pub const BETA: &str = "beta.example";

/// A temp content root with views for two tenants.
pub struct TestSite {
    pub dir: TempDir,
    pub config: AppConfig,
    pub renders: Arc<AtomicUsize>,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("SiteViews");

        write(&views.join("alp/Views/Home/Index.html"), "<h1>{{tenant}} {{title}} {{lang}}</h1>");
        write(&views.join("alp/Views/Shared/Privacy.html"), "<p>alpha privacy</p>");
        write(&views.join("alp/Views/Resource/Detail.html"), "<p>{{category}}/{{slug}}</p>");
        write(&views.join("bet/Views/Home/Index.html"), "<h1>beta {{title}}</h1>");

        let mut config = AppConfig::default();
        config.page_cache.content_root = dir.path().to_path_buf();
        config.views.root = views;
        config.tenants = vec![tenant("Alpha", "alp", ALPHA), tenant("Beta", "bet", BETA)];

        Self {
            dir,
            config,
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn server(&self) -> HttpServer {
        let views = CountingViews {
            inner: FileViewEngine::new(self.config.views.root.clone()),
            renders: self.renders.clone(),
        };
        HttpServer::with_components(self.config.clone(), builtin_controllers(), Arc::new(views)).unwrap()
    }

    pub fn cache_root(&self) -> PathBuf {
        self.config.page_cache.root()
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

pub fn tenant(name: &str, short: &str, host: &str) -> TenantConfig {
    TenantConfig {
        name: name.into(),
        identifier: name.to_lowercase(),
        short_identifier: short.into(),
        host: host.into(),
    }
}

pub fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// File view engine that counts render calls.
pub struct CountingViews {
    inner: FileViewEngine,
    renders: Arc<AtomicUsize>,
}

impl ViewEngine for CountingViews {
    fn render<'a>(
        &'a self,
        tenant: &'a Tenant,
        controller: &'a str,
        view: &'a str,
        model: &'a Value,
    ) -> BoxFuture<'a, Result<String, ViewError>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render(tenant, controller, view, model)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get("location").and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
        bytes: body.to_vec(),
    }
}

pub async fn get(router: &Router, host: &str, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .header("Host", host)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}
