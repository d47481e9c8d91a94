//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the front.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the multi-tenant front.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// On-disk page cache settings.
    pub page_cache: PageCacheConfig,

    /// Template lookup settings.
    pub views: ViewConfig,

    /// Locale table, in declaration order.
    pub locales: Vec<LocaleConfig>,

    /// Tenant (domain app) definitions, in declaration order.
    pub tenants: Vec<TenantConfig>,

    /// Route templates registered once per tenant.
    pub route_templates: Vec<RouteTemplateConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            page_cache: PageCacheConfig::default(),
            views: ViewConfig::default(),
            locales: default_locales(),
            tenants: Vec::new(),
            route_templates: default_route_templates(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PageCacheConfig {
    /// Serve and maintain cached pages. When false the middleware is a passthrough.
    pub enabled: bool,

    /// Content root the cache folder lives under.
    pub content_root: PathBuf,

    /// Cache folder name, relative to `content_root`.
    pub folder: String,

    /// Regenerate on cache miss. When false a miss answers 404.
    pub auto_generate: bool,

    /// Largest rendered body buffered for write-back, in bytes.
    pub max_body_bytes: usize,
}

impl PageCacheConfig {
    /// Directory holding the cache artifacts.
    pub fn root(&self) -> PathBuf {
        self.content_root.join(&self.folder)
    }
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_root: PathBuf::from("."),
            folder: ".PageCaches".to_string(),
            auto_generate: true,
            max_body_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Template lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Root directory holding one `<short_identifier>/Views` tree per tenant.
    pub root: PathBuf,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("SiteViews"),
        }
    }
}

/// One row of the locale table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocaleConfig {
    /// Two-letter code, e.g. "en".
    pub code: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub default: bool,
}

/// Tenant (domain app) definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantConfig {
    /// Display name.
    pub name: String,

    /// Stable identifier.
    pub identifier: String,

    /// Short identifier, used as the tenant's template namespace.
    pub short_identifier: String,

    /// Host header value that selects this tenant (case-insensitive).
    pub host: String,
}

/// A route template registered for every tenant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteTemplateConfig {
    /// Logical purpose, e.g. "resource" or "default".
    pub name: String,

    /// Templated path, e.g. "/{lang:SupportedLocals}/{controller=Home}/{action=Index}".
    pub pattern: String,

    /// Route values supplied when the pattern does not capture them.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Endpoint order (lower = preferred).
    #[serde(default)]
    pub order: i32,
}

fn default_true() -> bool {
    true
}

fn default_locales() -> Vec<LocaleConfig> {
    let locale = |code: &str, enabled: bool, default: bool| LocaleConfig {
        code: code.to_string(),
        enabled,
        default,
    };
    vec![
        locale("en", true, true),
        locale("jp", true, false),
        locale("de", true, false),
        locale("es", true, false),
        locale("zh", false, false),
    ]
}

fn default_route_templates() -> Vec<RouteTemplateConfig> {
    vec![
        RouteTemplateConfig {
            name: "resource".to_string(),
            pattern: "/{lang:SupportedLocals}/resource/{level1Category}/{*slug}".to_string(),
            defaults: BTreeMap::from([
                ("controller".to_string(), "Resource".to_string()),
                ("action".to_string(), "Detail".to_string()),
            ]),
            order: 0,
        },
        RouteTemplateConfig {
            name: "default".to_string(),
            pattern: "/{lang:SupportedLocals}/{controller=Home}/{action=Index}".to_string(),
            defaults: BTreeMap::new(),
            order: 0,
        },
    ]
}
