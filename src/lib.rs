//! Multi-tenant web front.
//!
//! One process serves several tenants (domain apps), each selected by the
//! request's Host header. GET page requests are locale-prefixed, served from
//! an on-disk page cache when possible, and otherwise rendered through a
//! per-tenant route table and written back to the cache.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod locale;
pub mod observability;
pub mod pages;
pub mod render;
pub mod routing;
pub mod tenants;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
