//! Endpoint selection.
//!
//! # Responsibilities
//! - Find endpoints whose pattern and constraints match the path
//! - Order candidates (endpoint order, policy comparers, declaration order)
//! - Run matcher policies over the candidate set
//! - Return the first surviving candidate or an explicit no-match

use std::sync::Arc;

use crate::routing::data_source::EndpointTable;
use crate::routing::endpoint::{Endpoint, RouteMatch, RouteValues};
use crate::routing::policy::{HostMatchPolicy, MatcherPolicy};

/// Request data the matcher and its policies look at.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub path: &'a str,
    pub host: Option<&'a str>,
}

#[derive(Debug)]
struct Candidate {
    endpoint: Arc<Endpoint>,
    values: RouteValues,
    valid: bool,
}

/// Structurally matching endpoints for one request.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.candidates[index].valid
    }

    pub fn set_validity(&mut self, index: usize, valid: bool) {
        self.candidates[index].valid = valid;
    }

    pub fn endpoint(&self, index: usize) -> &Arc<Endpoint> {
        &self.candidates[index].endpoint
    }

    pub fn values(&self, index: usize) -> &RouteValues {
        &self.candidates[index].values
    }
}

/// Selects an endpoint from the active table.
#[derive(Debug, Clone)]
pub struct EndpointMatcher {
    policies: Vec<Arc<dyn MatcherPolicy>>,
}

impl EndpointMatcher {
    pub fn new(mut policies: Vec<Arc<dyn MatcherPolicy>>) -> Self {
        policies.sort_by_key(|p| p.order());
        Self { policies }
    }

    pub fn match_request(&self, table: &EndpointTable, context: &MatchContext<'_>) -> Option<RouteMatch> {
        let mut matched: Vec<Candidate> = table
            .endpoints()
            .iter()
            .filter_map(|endpoint| {
                endpoint.match_path(context.path).map(|values| Candidate {
                    endpoint: endpoint.clone(),
                    values,
                    valid: true,
                })
            })
            .collect();

        if matched.is_empty() {
            return None;
        }

        // stable: ties keep declaration order
        matched.sort_by(|a, b| {
            a.endpoint.order().cmp(&b.endpoint.order()).then_with(|| {
                self.policies
                    .iter()
                    .map(|p| p.compare(&a.endpoint, &b.endpoint))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });

        let mut candidates = CandidateSet { candidates: matched };
        let endpoints: Vec<Arc<Endpoint>> = candidates.candidates.iter().map(|c| c.endpoint.clone()).collect();
        for policy in &self.policies {
            if policy.applies_to_endpoints(&endpoints) {
                policy.apply(context, &mut candidates);
            }
        }

        candidates
            .candidates
            .into_iter()
            .find(|c| c.valid)
            .map(|c| RouteMatch {
                endpoint: c.endpoint,
                values: c.values,
            })
    }
}

impl Default for EndpointMatcher {
    fn default() -> Self {
        Self::new(vec![Arc::new(HostMatchPolicy)])
    }
}
