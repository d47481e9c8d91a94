//! Locale resolution subsystem.
//!
//! # Data Flow
//! ```text
//! GET request (non-static)
//!     → resolver.rs (first path segment, Accept-Language, locale table)
//!     → Resolved(code): RequestLocale extension, continue
//!     → Redirect(location): 301, pipeline ends
//! ```
//!
//! # Design Decisions
//! - Locale support is an explicit table built once from config
//! - The first enabled default locale is the fallback
//! - Resolution is a pure function; the middleware only applies its decision

pub mod middleware;
pub mod resolver;
pub mod table;

pub use middleware::{locale_middleware, RequestLocale};
pub use resolver::{resolve, LocaleDecision};
pub use table::{LocaleError, LocaleTable};
