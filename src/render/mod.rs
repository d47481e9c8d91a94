//! Render/dispatch collaborator.
//!
//! # Data Flow
//! ```text
//! matched endpoint (RouteMatch)
//!     → dispatcher.rs (tenant by Host, controller/action from route values)
//!     → controller.rs (action function → ActionResult)
//!     → view.rs (locate tenant view, substitute model) → text/html
//! ```
//!
//! # Design Decisions
//! - Controllers are an explicit registry populated at startup
//! - Dispatch failures become short plain-text responses, never panics

pub mod builtin;
pub mod controller;
pub mod dispatcher;
pub mod view;

pub use builtin::builtin_controllers;
pub use controller::{ActionContext, ActionFn, ActionResult, Controller, ControllerRegistry};
pub use dispatcher::{DispatchError, Dispatcher};
pub use view::{FileViewEngine, ViewEngine, ViewError};
