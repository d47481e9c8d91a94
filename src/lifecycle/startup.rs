//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the locale table, tenant registry and route table from config
//! - Bind every route endpoint to the dispatcher
//!
//! # Design Decisions
//! - Fail fast: an invalid tenant, locale table or route template aborts startup
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use crate::config::AppConfig;
use crate::http::server::AppState;
use crate::locale::{LocaleError, LocaleTable};
use crate::pages::PageCacheState;
use crate::render::{ControllerRegistry, Dispatcher, ViewEngine};
use crate::routing::{ConstraintMap, EndpointDataSource, EndpointMatcher, RouteTableError};
use crate::tenants::{TenantError, TenantRegistry, TenantSet};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid locale table: {0}")]
    Locale(#[from] LocaleError),

    #[error("invalid tenants: {0}")]
    Tenant(#[from] TenantError),

    #[error("route table: {0}")]
    RouteTable(#[from] RouteTableError),
}

pub fn build_state(
    config: &AppConfig,
    controllers: ControllerRegistry,
    views: Arc<dyn ViewEngine>,
) -> Result<AppState, StartupError> {
    let locales = Arc::new(LocaleTable::from_config(&config.locales)?);
    let tenants = Arc::new(TenantRegistry::new(TenantSet::from_config(&config.tenants)?));

    let data_source = Arc::new(EndpointDataSource::new(ConstraintMap::new(locales.clone())));
    let dispatcher = Arc::new(Dispatcher::new(tenants.clone(), controllers, views));
    data_source.set_request_handler(dispatcher)?;
    data_source.load(&tenants.snapshot(), &config.route_templates)?;

    let page_cache = Arc::new(PageCacheState::new(&config.page_cache, tenants.clone()));

    tracing::info!(
        tenants = tenants.snapshot().len(),
        locales = locales.enabled_codes().len(),
        default_locale = %locales.default_code(),
        page_cache = %page_cache.cache().root().display(),
        page_cache_enabled = config.page_cache.enabled,
        "Subsystems initialized"
    );

    Ok(AppState {
        tenants,
        locales,
        data_source,
        matcher: Arc::new(EndpointMatcher::default()),
        page_cache,
    })
}
