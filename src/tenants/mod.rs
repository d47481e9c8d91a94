//! Tenant (domain app) subsystem.
//!
//! # Data Flow
//! ```text
//! [[tenants]] config records
//!     → TenantSet::from_config (validate, index by lower-cased host)
//!     → TenantRegistry (published snapshot)
//!     → route table builder, page cache middleware, dispatcher
//! ```
//!
//! # Design Decisions
//! - A tenant is identified by its Host header, compared case-insensitively
//! - Snapshots are immutable; a reload publishes a new set, never edits one

pub mod registry;

pub use registry::{Tenant, TenantError, TenantRegistry, TenantSet};
