//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Table Build (startup, and on every reload):
//!     TenantSet × [[route_templates]]
//!     → RouteState per (tenant host, template)
//!     → compile pattern + constraints (memoized per RouteState)
//!     → EndpointTable, published atomically with a fresh ChangeToken
//!
//! Incoming Request (host, path)
//!     → matcher.rs (structural match against the active table)
//!     → policy.rs (host match filter narrows candidates)
//!     → Return: RouteMatch or NoMatch
//! ```
//!
//! # Design Decisions
//! - Tables are immutable snapshots; reloads publish a new one
//! - Reads are lock-free; builds and swaps are serialized
//! - Deterministic: same table and request always select the same endpoint
//! - First surviving candidate wins (endpoint order, then declaration order)

pub mod change_token;
pub mod constraints;
pub mod data_source;
pub mod endpoint;
pub mod matcher;
pub mod pattern;
pub mod policy;

pub use change_token::ChangeToken;
pub use constraints::{ConstraintMap, RouteConstraint};
pub use data_source::{EndpointDataSource, EndpointTable, RouteTableError};
pub use endpoint::{BoxFuture, Endpoint, EndpointHandler, EndpointMetadata, RouteMatch, RouteState, RouteValues};
pub use matcher::{CandidateSet, EndpointMatcher, MatchContext};
pub use pattern::{PatternError, RoutePattern};
pub use policy::{HostMatchPolicy, MatcherPolicy};
