//! Controllers every deployment ships with.

use serde_json::json;

use crate::render::controller::{ActionContext, ActionResult, Controller, ControllerRegistry};

/// `Home` (`Index`, `Privacy`) and `Resource` (`Detail`).
pub fn builtin_controllers() -> ControllerRegistry {
    ControllerRegistry::new()
        .register(
            Controller::new("Home")
                .action("Index", |ctx| ActionResult::view(page_model(ctx, "Home")))
                .action("Privacy", |ctx| ActionResult::view(page_model(ctx, "Privacy"))),
        )
        .register(Controller::new("Resource").action("Detail", resource_detail))
}

fn page_model(ctx: &ActionContext, title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "tenant": ctx.tenant.name,
        "tenantId": ctx.tenant.identifier,
        "lang": ctx.locale,
        "controller": ctx.controller,
        "action": ctx.action,
    })
}

fn resource_detail(ctx: &ActionContext) -> ActionResult {
    let category = ctx.values.get("level1Category").unwrap_or_default();
    let slug = ctx.values.get("slug").unwrap_or_default();
    if category.is_empty() || slug.is_empty() {
        return ActionResult::NotFound;
    }

    let mut model = page_model(ctx, slug);
    model["category"] = json!(category);
    model["slug"] = json!(slug);
    ActionResult::view(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::GenerateMode;
    use crate::routing::RouteValues;
    use crate::tenants::Tenant;
    use std::sync::Arc;

    fn context(controller: &str, action: &str, values: &[(&str, &str)]) -> ActionContext {
        let mut route_values = RouteValues::default();
        for (k, v) in values {
            route_values.insert(*k, *v);
        }
        ActionContext {
            tenant: Arc::new(Tenant {
                name: "Alpha".into(),
                identifier: "alpha".into(),
                short_identifier: "alp".into(),
                host: "a.example".into(),
            }),
            controller: controller.into(),
            action: action.into(),
            locale: "en".into(),
            values: route_values,
            generate_mode: GenerateMode::AutoGenerating,
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_controllers();
        assert_eq!(registry.len(), 2);
        assert!(registry.find("home").and_then(|c| c.find_action("privacy")).is_some());
        assert!(registry.find("resource").and_then(|c| c.find_action("detail")).is_some());
    }

    #[test]
    fn test_resource_detail_model() {
        let ctx = context("Resource", "Detail", &[("level1Category", "guides"), ("slug", "a/b")]);
        match resource_detail(&ctx) {
            ActionResult::View { name, model } => {
                assert_eq!(name, None);
                assert_eq!(model["category"], "guides");
                assert_eq!(model["slug"], "a/b");
                assert_eq!(model["tenant"], "Alpha");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let ctx = context("Resource", "Detail", &[("level1Category", "guides")]);
        assert_eq!(resource_detail(&ctx), ActionResult::NotFound);
    }
}
