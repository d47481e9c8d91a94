//! Controllers and their actions.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::pages::GenerateMode;
use crate::routing::RouteValues;
use crate::tenants::Tenant;

/// Everything an action can see about the request it serves.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub tenant: Arc<Tenant>,
    pub controller: String,
    pub action: String,
    pub locale: String,
    pub values: RouteValues,
    pub generate_mode: GenerateMode,
}

/// What an action asks the dispatcher to send back.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Render a view. `name` defaults to the action name.
    View { name: Option<String>, model: Value },
    Content(String),
    NotFound,
}

impl ActionResult {
    pub fn view(model: Value) -> Self {
        ActionResult::View { name: None, model }
    }
}

pub type ActionFn = Arc<dyn Fn(&ActionContext) -> ActionResult + Send + Sync>;

/// A named set of actions. Action names are case-insensitive.
#[derive(Clone)]
pub struct Controller {
    name: String,
    actions: HashMap<String, (String, ActionFn)>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    pub fn action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&ActionContext) -> ActionResult + Send + Sync + 'static,
    {
        self.actions
            .insert(name.to_ascii_lowercase(), (name.to_string(), Arc::new(action)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action's registered name and function.
    pub fn find_action(&self, name: &str) -> Option<(&str, &ActionFn)> {
        self.actions
            .get(&name.to_ascii_lowercase())
            .map(|(registered, action)| (registered.as_str(), action))
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&str> = self.actions.values().map(|(n, _)| n.as_str()).collect();
        actions.sort_unstable();
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("actions", &actions)
            .finish()
    }
}

/// Controller name → controller, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, replacing any with the same name.
    pub fn register(mut self, controller: Controller) -> Self {
        self.controllers
            .insert(controller.name.to_ascii_lowercase(), controller);
        self
    }

    pub fn find(&self, name: &str) -> Option<&Controller> {
        self.controllers.get(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ControllerRegistry::new().register(
            Controller::new("Home").action("Index", |_| ActionResult::Content("hi".into())),
        );

        let controller = registry.find("HOME").unwrap();
        assert_eq!(controller.name(), "Home");

        let (name, _) = controller.find_action("index").unwrap();
        assert_eq!(name, "Index");
        assert!(controller.find_action("Privacy").is_none());
        assert!(registry.find("About").is_none());
    }
}
