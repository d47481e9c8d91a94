//! Compiled endpoints and the per-tenant route states they come from.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use axum::{body::Body, http::Request, response::Response};

use crate::routing::constraints::RouteConstraint;
use crate::routing::pattern::RoutePattern;
use crate::tenants::Tenant;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The single request-handling entry point every endpoint is bound to.
pub trait EndpointHandler: Send + Sync {
    fn handle(self: Arc<Self>, request: Request<Body>, route: RouteMatch) -> BoxFuture<'static, Response>;
}

/// Route values captured from the path, merged with template defaults.
///
/// Keys compare ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues(BTreeMap<String, String>);

impl RouteValues {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert unless a value for `key` already exists.
    pub fn insert_default(&mut self, key: &str, value: &str) {
        if !self.contains(key) {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Matching metadata carried by an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointMetadata {
    /// Host this endpoint serves. `None` means any host.
    pub host: Option<String>,
    /// Tenant the endpoint was registered for, published with the table.
    pub tenant: Option<Arc<Tenant>>,
}

/// A matchable endpoint.
pub struct Endpoint {
    display_name: String,
    pattern: RoutePattern,
    constraints: Vec<(String, Arc<dyn RouteConstraint>)>,
    defaults: BTreeMap<String, String>,
    order: i32,
    metadata: EndpointMetadata,
    handler: Arc<dyn EndpointHandler>,
}

impl Endpoint {
    pub fn new(
        pattern: RoutePattern,
        constraints: Vec<(String, Arc<dyn RouteConstraint>)>,
        defaults: BTreeMap<String, String>,
        order: i32,
        metadata: EndpointMetadata,
        handler: Arc<dyn EndpointHandler>,
    ) -> Self {
        Self {
            display_name: pattern.raw().to_string(),
            pattern,
            constraints,
            defaults,
            order,
            metadata,
            handler,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn metadata(&self) -> &EndpointMetadata {
        &self.metadata
    }

    pub fn handler(&self) -> Arc<dyn EndpointHandler> {
        self.handler.clone()
    }

    /// Match the path structurally and against constraints.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let captured = self.pattern.match_path(path)?;

        let mut values = RouteValues::default();
        for (name, value) in captured {
            values.insert(name, value);
        }

        for (name, constraint) in &self.constraints {
            if let Some(value) = values.get(name) {
                if !constraint.matches(value) {
                    return None;
                }
            }
        }

        for (key, value) in &self.defaults {
            values.insert_default(key, value);
        }
        Some(values)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("display_name", &self.display_name)
            .field("order", &self.order)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A matched endpoint and its route values.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub endpoint: Arc<Endpoint>,
    pub values: RouteValues,
}

/// One registered route: tenant × route template.
///
/// The compiled endpoint is memoized; it is set at most once and only ever
/// replaced by building a new `RouteState`.
#[derive(Debug)]
pub struct RouteState {
    pub key: String,
    pub tenant: Arc<Tenant>,
    pub host: String,
    pub pattern: String,
    pub defaults: BTreeMap<String, String>,
    pub order: i32,
    cached_endpoint: OnceLock<Arc<Endpoint>>,
}

impl RouteState {
    pub fn new(
        tenant: &Arc<Tenant>,
        template_name: &str,
        pattern: &str,
        defaults: BTreeMap<String, String>,
        order: i32,
    ) -> Self {
        Self {
            key: format!("{}/{}", tenant.host.to_ascii_lowercase(), template_name),
            tenant: tenant.clone(),
            host: tenant.host.clone(),
            pattern: pattern.to_string(),
            defaults,
            order,
            cached_endpoint: OnceLock::new(),
        }
    }

    /// True if `other` describes the same route, so its compiled endpoint can be reused.
    pub fn same_route(&self, other: &RouteState) -> bool {
        self.key == other.key
            && *self.tenant == *other.tenant
            && self.host == other.host
            && self.pattern == other.pattern
            && self.defaults == other.defaults
            && self.order == other.order
    }

    pub fn cached_endpoint(&self) -> Option<&Arc<Endpoint>> {
        self.cached_endpoint.get()
    }

    pub(crate) fn cache_endpoint(&self, endpoint: Arc<Endpoint>) -> Arc<Endpoint> {
        match self.cached_endpoint.set(endpoint.clone()) {
            Ok(()) => endpoint,
            Err(_) => self.cached_endpoint.get().cloned().unwrap_or(endpoint),
        }
    }
}
