//! Host → tenant lookup.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::TenantConfig;

/// A tenant descriptor. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub name: String,
    pub identifier: String,
    pub short_identifier: String,
    pub host: String,
}

impl Tenant {
    /// True if `host` selects this tenant.
    pub fn matches_host(&self, host: &str) -> bool {
        self.host.eq_ignore_ascii_case(host)
    }
}

impl From<&TenantConfig> for Tenant {
    fn from(config: &TenantConfig) -> Self {
        Self {
            name: config.name.trim().to_string(),
            identifier: config.identifier.trim().to_string(),
            short_identifier: config.short_identifier.trim().to_string(),
            host: config.host.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("tenant '{0}' has no host")]
    MissingHost(String),

    #[error("host '{0}' is claimed by more than one tenant")]
    DuplicateHost(String),
}

/// An ordered, host-indexed set of tenants.
#[derive(Debug, Default)]
pub struct TenantSet {
    tenants: Vec<Arc<Tenant>>,
    by_host: HashMap<String, usize>,
}

impl TenantSet {
    /// Build a set from tenant descriptors, rejecting missing or duplicate hosts.
    pub fn new(tenants: Vec<Tenant>) -> Result<Self, TenantError> {
        let mut by_host = HashMap::with_capacity(tenants.len());
        for (index, tenant) in tenants.iter().enumerate() {
            if tenant.host.is_empty() {
                return Err(TenantError::MissingHost(tenant.name.clone()));
            }
            if by_host.insert(tenant.host.to_ascii_lowercase(), index).is_some() {
                return Err(TenantError::DuplicateHost(tenant.host.clone()));
            }
        }

        Ok(Self {
            tenants: tenants.into_iter().map(Arc::new).collect(),
            by_host,
        })
    }

    pub fn from_config(configs: &[TenantConfig]) -> Result<Self, TenantError> {
        Self::new(configs.iter().map(Tenant::from).collect())
    }

    /// Find the tenant for a Host header value.
    pub fn find(&self, host: &str) -> Option<&Arc<Tenant>> {
        self.by_host
            .get(&host.to_ascii_lowercase())
            .map(|&index| &self.tenants[index])
    }

    pub fn contains(&self, host: &str) -> bool {
        self.by_host.contains_key(&host.to_ascii_lowercase())
    }

    /// Tenants in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tenant>> {
        self.tenants.iter()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

/// Process-wide tenant registry.
///
/// Readers take a snapshot without locking; `replace` publishes a whole new set.
#[derive(Debug)]
pub struct TenantRegistry {
    current: ArcSwap<TenantSet>,
}

impl TenantRegistry {
    pub fn new(tenants: TenantSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(tenants),
        }
    }

    /// The currently published tenant set.
    pub fn snapshot(&self) -> Arc<TenantSet> {
        self.current.load_full()
    }

    pub fn find(&self, host: &str) -> Option<Arc<Tenant>> {
        self.current.load().find(host).cloned()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.current.load().contains(host)
    }

    /// Publish a new tenant set, superseding the current one.
    pub fn replace(&self, tenants: Arc<TenantSet>) {
        tracing::info!(tenants = tenants.len(), "Tenant registry replaced");
        self.current.store(tenants);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(name: &str, host: &str) -> Tenant {
        Tenant {
            name: name.into(),
            identifier: name.to_lowercase(),
            short_identifier: name.to_lowercase(),
            host: host.into(),
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let set = TenantSet::new(vec![tenant("Apple", "apple.example")]).unwrap();
        assert_eq!(set.find("APPLE.example").unwrap().name, "Apple");
        assert!(set.contains("Apple.Example"));
        assert!(set.find("pear.example").is_none());
    }

    #[test]
    fn test_rejects_duplicate_and_missing_hosts() {
        let err = TenantSet::new(vec![tenant("A", "a.example"), tenant("B", "A.EXAMPLE")]).unwrap_err();
        assert_eq!(err, TenantError::DuplicateHost("A.EXAMPLE".into()));

        let err = TenantSet::new(vec![tenant("A", "")]).unwrap_err();
        assert_eq!(err, TenantError::MissingHost("A".into()));
    }

    #[test]
    fn test_from_config_trims_fields() {
        let configs = vec![TenantConfig {
            name: " Apple ".into(),
            identifier: "apple-site".into(),
            short_identifier: "apple".into(),
            host: " apple.example ".into(),
        }];
        let set = TenantSet::from_config(&configs).unwrap();
        assert_eq!(set.find("apple.example").unwrap().name, "Apple");
    }

    #[test]
    fn test_registry_replace_publishes_new_set() {
        let registry = TenantRegistry::new(TenantSet::new(vec![tenant("A", "a.example")]).unwrap());
        let before = registry.snapshot();

        registry.replace(Arc::new(TenantSet::new(vec![tenant("B", "b.example")]).unwrap()));

        assert!(before.contains("a.example"));
        assert!(!registry.contains("a.example"));
        assert!(registry.find("b.example").is_some());
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let set = TenantSet::new(vec![tenant("Z", "z.example"), tenant("A", "a.example")]).unwrap();
        let names: Vec<_> = set.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Z", "A"]);
    }
}
