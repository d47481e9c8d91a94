//! Routing-time candidate policies.
//!
//! # Design Decisions
//! - Policies only narrow the candidate set; they never add matches
//! - Host matching is ordinal and ASCII case-insensitive
//! - Endpoints without a declared host pass through untouched

use std::cmp::Ordering;
use std::sync::Arc;

use crate::routing::endpoint::Endpoint;
use crate::routing::matcher::{CandidateSet, MatchContext};

/// A filter applied to structurally matching candidates.
pub trait MatcherPolicy: Send + Sync + std::fmt::Debug {
    /// Policies run in ascending order.
    fn order(&self) -> i32 {
        0
    }

    /// True if any of `endpoints` carries metadata this policy inspects.
    fn applies_to_endpoints(&self, endpoints: &[Arc<Endpoint>]) -> bool;

    /// Invalidate candidates that do not fit the request.
    fn apply(&self, context: &MatchContext<'_>, candidates: &mut CandidateSet);

    /// Tie-break between two endpoints. `Equal` leaves declaration order in charge.
    fn compare(&self, _a: &Endpoint, _b: &Endpoint) -> Ordering {
        Ordering::Equal
    }
}

/// Drops candidates whose declared host differs from the request's Host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMatchPolicy;

impl HostMatchPolicy {
    fn host_matches(declared: &str, request_host: Option<&str>) -> bool {
        request_host.is_some_and(|host| !host.is_empty() && host.eq_ignore_ascii_case(declared))
    }
}

impl MatcherPolicy for HostMatchPolicy {
    fn applies_to_endpoints(&self, endpoints: &[Arc<Endpoint>]) -> bool {
        endpoints.iter().any(|e| e.metadata().host.is_some())
    }

    fn apply(&self, context: &MatchContext<'_>, candidates: &mut CandidateSet) {
        for index in 0..candidates.len() {
            if !candidates.is_valid(index) {
                continue;
            }
            let Some(declared) = candidates.endpoint(index).metadata().host.as_deref() else {
                continue;
            };
            if !Self::host_matches(declared, context.host) {
                candidates.set_validity(index, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_comparison() {
        assert!(HostMatchPolicy::host_matches("a.example", Some("A.EXAMPLE")));
        assert!(HostMatchPolicy::host_matches("a.example:8080", Some("a.example:8080")));
        assert!(!HostMatchPolicy::host_matches("a.example", Some("a.example:8080")));
        assert!(!HostMatchPolicy::host_matches("a.example", Some("")));
        assert!(!HostMatchPolicy::host_matches("a.example", None));
    }
}
