//! Page cache subsystem.
//!
//! # Data Flow
//! ```text
//! GET /<lang>/<page> for a known tenant
//!     → middleware.rs
//!         not a page (css, png, ...)      → passthrough
//!         RefreshCache=true / batch       → tag Force/BatchGenerating, render, write back
//!         /<lang> or no .html suffix      → 301 to canonical .html path
//!         cache.rs finds artifact         → serve it, pipeline ends
//!         miss (or unreadable artifact)   → tag AutoGenerating, render, write back
//! ```
//!
//! # Design Decisions
//! - Artifact path is a pure, injective function of the request path
//! - No TTL: artifacts change only by forced regeneration or external deletion
//! - Concurrent writers to one artifact race; last write wins, never torn
//! - Cache I/O failures degrade to a miss or a skipped write, never a failed request

pub mod batch;
pub mod cache;
pub mod generate;
pub mod middleware;

pub use batch::{BatchGenerator, BatchOutcome};
pub use cache::{CachePathError, PageCache};
pub use generate::{BatchRequest, GenerateMode, PageGeneration, PageWritten};
pub use middleware::{page_cache_middleware, PageCacheState};
