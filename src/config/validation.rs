//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Tenant hosts present and unique (case-insensitive)
//! - Locale table well-formed (one enabled default)
//! - Route templates parse and only use known constraints
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use crate::config::schema::AppConfig;
use crate::routing::pattern::{PatternError, RoutePattern};
use crate::routing::constraints::ConstraintMap;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("tenant #{index} has an empty {field}")]
    EmptyTenantField { index: usize, field: &'static str },

    #[error("tenant host '{0}' is declared more than once")]
    DuplicateHost(String),

    #[error("locale code '{0}' is not two ASCII letters")]
    InvalidLocaleCode(String),

    #[error("no enabled locale configured")]
    NoEnabledLocale,

    #[error("more than one default locale: {0:?}")]
    MultipleDefaultLocales(Vec<String>),

    #[error("default locale '{0}' is disabled")]
    DisabledDefaultLocale(String),

    #[error("route template '{name}': {source}")]
    InvalidRouteTemplate { name: String, source: PatternError },

    #[error("route template '{name}' uses unknown constraint '{constraint}'")]
    UnknownConstraint { name: String, constraint: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_tenants(config, &mut errors);
    validate_locales(config, &mut errors);
    validate_route_templates(config, &mut errors);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tenants(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (index, tenant) in config.tenants.iter().enumerate() {
        let fields = [
            ("name", &tenant.name),
            ("identifier", &tenant.identifier),
            ("short_identifier", &tenant.short_identifier),
            ("host", &tenant.host),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                errors.push(ValidationError::EmptyTenantField { index, field });
            }
        }

        let key = tenant.host.trim().to_ascii_lowercase();
        if !key.is_empty() && !seen.insert(key) {
            errors.push(ValidationError::DuplicateHost(tenant.host.clone()));
        }
    }
}

fn validate_locales(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    for locale in &config.locales {
        if locale.code.len() != 2 || !locale.code.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push(ValidationError::InvalidLocaleCode(locale.code.clone()));
        }
    }

    if !config.locales.iter().any(|l| l.enabled) {
        errors.push(ValidationError::NoEnabledLocale);
    }

    let defaults: Vec<_> = config.locales.iter().filter(|l| l.default).collect();
    if defaults.len() > 1 {
        errors.push(ValidationError::MultipleDefaultLocales(
            defaults.iter().map(|l| l.code.clone()).collect(),
        ));
    }
    for locale in defaults {
        if !locale.enabled {
            errors.push(ValidationError::DisabledDefaultLocale(locale.code.clone()));
        }
    }
}

fn validate_route_templates(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    for template in &config.route_templates {
        match RoutePattern::parse(&template.pattern) {
            Ok(pattern) => {
                for constraint in pattern.constraint_names() {
                    if !ConstraintMap::is_known(constraint) {
                        errors.push(ValidationError::UnknownConstraint {
                            name: template.name.clone(),
                            constraint: constraint.to_string(),
                        });
                    }
                }
            }
            Err(source) => errors.push(ValidationError::InvalidRouteTemplate {
                name: template.name.clone(),
                source,
            }),
        }
    }
}
