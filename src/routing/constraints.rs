//! Route value constraints.

use std::collections::HashMap;
use std::sync::Arc;

use crate::locale::LocaleTable;

/// A check applied to a captured route value.
pub trait RouteConstraint: Send + Sync + std::fmt::Debug {
    fn matches(&self, value: &str) -> bool;
}

/// Accepts any enabled locale code, case-insensitively.
#[derive(Debug)]
pub struct SupportedLocalesConstraint {
    locales: Arc<LocaleTable>,
}

impl SupportedLocalesConstraint {
    pub fn new(locales: Arc<LocaleTable>) -> Self {
        Self { locales }
    }
}

impl RouteConstraint for SupportedLocalesConstraint {
    fn matches(&self, value: &str) -> bool {
        self.locales.is_enabled(value)
    }
}

/// Constraint name → implementation. Names are case-insensitive.
#[derive(Debug, Clone)]
pub struct ConstraintMap {
    constraints: HashMap<String, Arc<dyn RouteConstraint>>,
}

impl ConstraintMap {
    pub const SUPPORTED_LOCALS: &'static str = "SupportedLocals";

    const KNOWN: [&'static str; 1] = [Self::SUPPORTED_LOCALS];

    pub fn new(locales: Arc<LocaleTable>) -> Self {
        let mut constraints: HashMap<String, Arc<dyn RouteConstraint>> = HashMap::new();
        constraints.insert(
            Self::SUPPORTED_LOCALS.to_ascii_lowercase(),
            Arc::new(SupportedLocalesConstraint::new(locales)),
        );
        Self { constraints }
    }

    /// True if `name` is a constraint the front ships with.
    pub fn is_known(name: &str) -> bool {
        Self::KNOWN.iter().any(|known| known.eq_ignore_ascii_case(name))
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn RouteConstraint>> {
        self.constraints.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_supported_locals_constraint() {
        let locales = Arc::new(LocaleTable::from_config(&AppConfig::default().locales).unwrap());
        let map = ConstraintMap::new(locales);

        let constraint = map.resolve("supportedlocals").unwrap();
        assert!(constraint.matches("en"));
        assert!(constraint.matches("DE"));
        assert!(!constraint.matches("zh"));
        assert!(!constraint.matches("home"));

        assert!(map.resolve("int").is_none());
        assert!(ConstraintMap::is_known("SUPPORTEDLOCALS"));
        assert!(!ConstraintMap::is_known("int"));
    }
}
