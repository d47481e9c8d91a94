//! Route table builder and store.
//!
//! # Responsibilities
//! - Register one `RouteState` per tenant × route template
//! - Compile route states into endpoints bound to the shared handler
//! - Publish the active table and its change token
//!
//! # Design Decisions
//! - Readers load the table and token through `ArcSwap` and never lock
//! - Build and swap happen under one mutex, so reloads are serialized
//! - A failed build publishes nothing; the previous table stays active
//! - Swap order: capture old token, publish table, publish new token, fire old token

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::config::RouteTemplateConfig;
use crate::observability::metrics;
use crate::routing::change_token::ChangeToken;
use crate::routing::constraints::ConstraintMap;
use crate::routing::endpoint::{Endpoint, EndpointHandler, EndpointMetadata, RouteState};
use crate::routing::pattern::{PatternError, RoutePattern};
use crate::tenants::TenantSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("route '{route}': {source}")]
    Pattern { route: String, source: PatternError },

    #[error("route '{route}' uses unknown constraint '{constraint}'")]
    UnknownConstraint { route: String, constraint: String },

    #[error("the request pipeline hasn't been assigned yet")]
    PipelineNotAssigned,

    #[error("the request pipeline was already assigned")]
    PipelineAlreadyAssigned,
}

/// A fully built, immutable route table.
#[derive(Debug, Default)]
pub struct EndpointTable {
    generation: u64,
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointTable {
    pub fn new(generation: u64, endpoints: Vec<Arc<Endpoint>>) -> Self {
        Self { generation, endpoints }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[derive(Default)]
struct Registered {
    route_states: Vec<Arc<RouteState>>,
    generation: u64,
}

/// Holds the active route table for all tenants.
pub struct EndpointDataSource {
    constraints: ConstraintMap,
    handler: OnceLock<Arc<dyn EndpointHandler>>,
    sync_root: Mutex<Registered>,
    endpoints: ArcSwapOption<EndpointTable>,
    change_token: ArcSwap<ChangeToken>,
}

impl EndpointDataSource {
    pub fn new(constraints: ConstraintMap) -> Self {
        Self {
            constraints,
            handler: OnceLock::new(),
            sync_root: Mutex::new(Registered::default()),
            endpoints: ArcSwapOption::empty(),
            change_token: ArcSwap::from_pointee(ChangeToken::new(0)),
        }
    }

    /// Bind the shared entry point. Must happen before the first compile.
    pub fn set_request_handler(&self, handler: Arc<dyn EndpointHandler>) -> Result<(), RouteTableError> {
        self.handler
            .set(handler)
            .map_err(|_| RouteTableError::PipelineAlreadyAssigned)
    }

    /// Register route states for every tenant and compile the first table.
    ///
    /// Any error here is fatal: the server must not start with a bad table.
    pub fn load(&self, tenants: &TenantSet, templates: &[RouteTemplateConfig]) -> Result<(), RouteTableError> {
        let mut registered = self.lock();
        let states = route_states_for(tenants, templates);
        tracing::info!(
            tenants = tenants.len(),
            route_states = states.len(),
            "Route states registered"
        );

        let table = self.rebuild(&mut registered, states)?;
        tracing::info!(endpoints = table.len(), generation = table.generation(), "Route table loaded");
        Ok(())
    }

    /// The active table, compiling it on first access.
    pub fn endpoints(&self) -> Result<Arc<EndpointTable>, RouteTableError> {
        if let Some(table) = self.endpoints.load_full() {
            return Ok(table);
        }

        let mut registered = self.lock();
        if let Some(table) = self.endpoints.load_full() {
            return Ok(table);
        }
        let states = registered.route_states.clone();
        self.rebuild(&mut registered, states)
    }

    /// Rebuild the table from `tenants` × `templates` and swap it in.
    ///
    /// Route states that did not change keep their compiled endpoints.
    /// On error the previously published table is left untouched.
    pub async fn reload(
        &self,
        tenants: &TenantSet,
        templates: &[RouteTemplateConfig],
    ) -> Result<Arc<EndpointTable>, RouteTableError> {
        let mut registered = self.lock();

        let states = route_states_for(tenants, templates)
            .into_iter()
            .map(|fresh| {
                registered
                    .route_states
                    .iter()
                    .find(|existing| existing.same_route(&fresh))
                    .cloned()
                    .unwrap_or(fresh)
            })
            .collect();

        match self.rebuild(&mut registered, states) {
            Ok(table) => {
                metrics::record_route_reload("ok");
                tracing::info!(endpoints = table.len(), generation = table.generation(), "Route table reloaded");
                Ok(table)
            }
            Err(e) => {
                metrics::record_route_reload("failed");
                tracing::error!(error = %e, "Route table reload failed, keeping previous table");
                Err(e)
            }
        }
    }

    /// Token for the currently published table.
    pub fn change_token(&self) -> Arc<ChangeToken> {
        self.change_token.load_full()
    }

    fn lock(&self) -> MutexGuard<'_, Registered> {
        self.sync_root.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compile `states` and publish them. Caller holds the lock.
    fn rebuild(
        &self,
        registered: &mut Registered,
        states: Vec<Arc<RouteState>>,
    ) -> Result<Arc<EndpointTable>, RouteTableError> {
        let handler = self
            .handler
            .get()
            .cloned()
            .ok_or(RouteTableError::PipelineNotAssigned)?;

        let mut endpoints = Vec::with_capacity(states.len());
        for state in &states {
            let endpoint = match state.cached_endpoint() {
                Some(endpoint) => endpoint.clone(),
                None => state.cache_endpoint(Arc::new(self.compile(state, handler.clone())?)),
            };
            endpoints.push(endpoint);
        }

        registered.generation += 1;
        registered.route_states = states;
        let table = Arc::new(EndpointTable {
            generation: registered.generation,
            endpoints,
        });
        self.publish(table.clone());
        Ok(table)
    }

    fn publish(&self, table: Arc<EndpointTable>) {
        let generation = table.generation;
        let endpoint_count = table.len();

        // 1. capture old token
        let old_token = self.change_token.load_full();
        // 2. publish endpoints
        self.endpoints.store(Some(table));
        // 3. publish new token
        self.change_token.store(Arc::new(ChangeToken::new(generation)));
        // 4. fire old token
        old_token.fire();

        metrics::record_endpoint_count(endpoint_count);
    }

    fn compile(&self, state: &RouteState, handler: Arc<dyn EndpointHandler>) -> Result<Endpoint, RouteTableError> {
        let pattern = RoutePattern::parse(&state.pattern).map_err(|source| RouteTableError::Pattern {
            route: state.key.clone(),
            source,
        })?;

        let mut constraints = Vec::new();
        for param in pattern.parameters() {
            if let Some(name) = &param.constraint {
                let constraint = self
                    .constraints
                    .resolve(name)
                    .ok_or_else(|| RouteTableError::UnknownConstraint {
                        route: state.key.clone(),
                        constraint: name.clone(),
                    })?;
                constraints.push((param.name.clone(), constraint));
            }
        }

        Ok(Endpoint::new(
            pattern,
            constraints,
            state.defaults.clone(),
            state.order,
            EndpointMetadata {
                host: Some(state.host.clone()),
                tenant: Some(state.tenant.clone()),
            },
            handler,
        ))
    }
}

fn route_states_for(tenants: &TenantSet, templates: &[RouteTemplateConfig]) -> Vec<Arc<RouteState>> {
    tenants
        .iter()
        .flat_map(|tenant| {
            templates.iter().map(move |template| {
                Arc::new(RouteState::new(
                    tenant,
                    &template.name,
                    &template.pattern,
                    template.defaults.clone(),
                    template.order,
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::locale::LocaleTable;
    use crate::routing::endpoint::{BoxFuture, RouteMatch};
    use crate::tenants::Tenant;
    use axum::{body::Body, http::Request, response::{IntoResponse, Response}};
    use std::time::Duration;

    struct Noop;

    impl EndpointHandler for Noop {
        fn handle(self: Arc<Self>, _request: Request<Body>, _route: RouteMatch) -> BoxFuture<'static, Response> {
            Box::pin(async { "ok".into_response() })
        }
    }

    fn tenants(hosts: &[&str]) -> TenantSet {
        TenantSet::new(
            hosts
                .iter()
                .map(|host| Tenant {
                    name: host.to_string(),
                    identifier: host.to_string(),
                    short_identifier: host.to_string(),
                    host: host.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn data_source() -> EndpointDataSource {
        let locales = Arc::new(LocaleTable::from_config(&AppConfig::default().locales).unwrap());
        let source = EndpointDataSource::new(ConstraintMap::new(locales));
        source.set_request_handler(Arc::new(Noop)).unwrap();
        source
    }

    fn templates() -> Vec<RouteTemplateConfig> {
        AppConfig::default().route_templates
    }

    #[test]
    fn test_load_registers_every_tenant() {
        let source = data_source();
        source.load(&tenants(&["a.example", "b.example"]), &templates()).unwrap();

        let table = source.endpoints().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.generation(), 1);
        let hosts: Vec<_> = table
            .endpoints()
            .iter()
            .map(|e| e.metadata().host.clone().unwrap())
            .collect();
        assert_eq!(hosts, ["a.example", "a.example", "b.example", "b.example"]);
        assert!(table
            .endpoints()
            .iter()
            .all(|e| e.metadata().tenant.as_ref().map(|t| t.host.as_str()) == e.metadata().host.as_deref()));
    }

    #[test]
    fn test_missing_pipeline_is_fatal() {
        let locales = Arc::new(LocaleTable::from_config(&AppConfig::default().locales).unwrap());
        let source = EndpointDataSource::new(ConstraintMap::new(locales));
        let err = source.load(&tenants(&["a.example"]), &templates()).unwrap_err();
        assert_eq!(err, RouteTableError::PipelineNotAssigned);
    }

    #[test]
    fn test_pipeline_assigned_once() {
        let source = data_source();
        assert_eq!(
            source.set_request_handler(Arc::new(Noop)).unwrap_err(),
            RouteTableError::PipelineAlreadyAssigned
        );
    }

    #[tokio::test]
    async fn test_reload_reuses_unchanged_endpoints() {
        let source = data_source();
        source.load(&tenants(&["a.example"]), &templates()).unwrap();
        let before = source.endpoints().unwrap();

        let after = source.reload(&tenants(&["a.example", "b.example"]), &templates()).await.unwrap();

        assert_eq!(after.generation(), 2);
        assert_eq!(after.len(), 4);
        assert!(Arc::ptr_eq(&before.endpoints()[0], &after.endpoints()[0]));
        assert!(Arc::ptr_eq(&before.endpoints()[1], &after.endpoints()[1]));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_table() {
        let source = data_source();
        source.load(&tenants(&["a.example"]), &templates()).unwrap();
        let token = source.change_token();

        let mut broken = templates();
        broken.push(RouteTemplateConfig {
            name: "broken".into(),
            pattern: "/{lang:NoSuchConstraint}".into(),
            defaults: Default::default(),
            order: 0,
        });
        let err = source.reload(&tenants(&["b.example"]), &broken).await.unwrap_err();

        assert!(matches!(err, RouteTableError::UnknownConstraint { .. }));
        let table = source.endpoints().unwrap();
        assert_eq!(table.generation(), 1);
        assert_eq!(table.endpoints()[0].metadata().host.as_deref(), Some("a.example"));
        assert!(!token.has_changed());
    }

    #[tokio::test]
    async fn test_old_token_fires_after_new_table_is_visible() {
        let source = Arc::new(data_source());
        source.load(&tenants(&["a.example"]), &templates()).unwrap();
        let token = source.change_token();
        assert_eq!(token.generation(), 1);

        let watcher = {
            let source = source.clone();
            let token = token.clone();
            tokio::spawn(async move {
                token.changed().await;
                let table = source.endpoints().unwrap();
                (table.generation(), source.change_token().generation())
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        source.reload(&tenants(&["b.example"]), &templates()).await.unwrap();

        let (table_generation, token_generation) = tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table_generation, 2);
        assert_eq!(token_generation, 2);
        assert!(token.has_changed());
        assert!(!source.change_token().has_changed());
    }
}
