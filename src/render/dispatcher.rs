//! Endpoint handler that runs controller actions for the matched tenant.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::request::{request_host, request_id};
use crate::http::response::{html, plain};
use crate::locale::RequestLocale;
use crate::pages::PageGeneration;
use crate::render::controller::{ActionContext, ActionResult, ControllerRegistry};
use crate::render::view::{ViewEngine, ViewError};
use crate::routing::{BoxFuture, EndpointHandler, RouteMatch};
use crate::tenants::TenantRegistry;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("DomainApp {0} does not exist.")]
    UnknownTenant(String),

    #[error("Controller or Action not specified")]
    MissingRouteValues,

    #[error("Controller not found")]
    ControllerNotFound(String),

    #[error("Action not found")]
    ActionNotFound { controller: String, action: String },

    #[error("View not found")]
    ViewNotFound(#[source] ViewError),

    #[error("Not found")]
    NotFound,

    #[error("View rendering failed")]
    View(#[source] ViewError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::UnknownTenant(_) | DispatchError::View(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ViewError> for DispatchError {
    fn from(e: ViewError) -> Self {
        match e {
            ViewError::NotFound { .. } => DispatchError::ViewNotFound(e),
            ViewError::Io { .. } => DispatchError::View(e),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        plain(self.status(), self.to_string())
    }
}

/// The single request handler every route endpoint is bound to.
pub struct Dispatcher {
    tenants: Arc<TenantRegistry>,
    controllers: ControllerRegistry,
    views: Arc<dyn ViewEngine>,
}

impl Dispatcher {
    pub fn new(tenants: Arc<TenantRegistry>, controllers: ControllerRegistry, views: Arc<dyn ViewEngine>) -> Self {
        Self {
            tenants,
            controllers,
            views,
        }
    }

    async fn dispatch(&self, request: Request<Body>, route: RouteMatch) -> Result<Response, DispatchError> {
        // the endpoint's tenant belongs to the same table snapshot as the match
        let host = request_host(&request).unwrap_or_default();
        let tenant = route
            .endpoint
            .metadata()
            .tenant
            .clone()
            .or_else(|| self.tenants.find(host))
            .ok_or_else(|| DispatchError::UnknownTenant(host.to_string()))?;

        let controller_name = route.values.get("controller").filter(|v| !v.trim().is_empty());
        let action_name = route.values.get("action").filter(|v| !v.trim().is_empty());
        let (Some(controller_name), Some(action_name)) = (controller_name, action_name) else {
            return Err(DispatchError::MissingRouteValues);
        };

        let controller = self
            .controllers
            .find(controller_name)
            .ok_or_else(|| DispatchError::ControllerNotFound(controller_name.to_string()))?;
        let (action_name, action) =
            controller
                .find_action(action_name)
                .ok_or_else(|| DispatchError::ActionNotFound {
                    controller: controller.name().to_string(),
                    action: action_name.to_string(),
                })?;

        let context = ActionContext {
            tenant: tenant.clone(),
            controller: controller.name().to_string(),
            action: action_name.to_string(),
            locale: request
                .extensions()
                .get::<RequestLocale>()
                .map(|l| l.0.clone())
                .unwrap_or_default(),
            values: route.values.clone(),
            generate_mode: request
                .extensions()
                .get::<PageGeneration>()
                .map(|g| g.mode)
                .unwrap_or_default(),
        };

        tracing::debug!(
            request_id = %request_id(&request),
            tenant = %tenant.name,
            controller = %context.controller,
            action = %context.action,
            mode = context.generate_mode.as_str(),
            "Dispatching action"
        );

        match action(&context) {
            ActionResult::View { name, model } => {
                let view = name.as_deref().unwrap_or(action_name);
                let body = self.views.render(&tenant, controller.name(), view, &model).await?;
                Ok(html(body))
            }
            ActionResult::Content(text) => Ok(text.into_response()),
            ActionResult::NotFound => Err(DispatchError::NotFound),
        }
    }
}

impl EndpointHandler for Dispatcher {
    fn handle(self: Arc<Self>, request: Request<Body>, route: RouteMatch) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let id = request_id(&request).to_string();
            match self.dispatch(request, route).await {
                Ok(response) => response,
                Err(e) => {
                    if e.status().is_server_error() {
                        tracing::error!(request_id = %id, error = ?e, "Dispatch failed");
                    } else {
                        tracing::debug!(request_id = %id, error = %e, "Dispatch rejected");
                    }
                    e.into_response()
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::controller::Controller;
    use crate::routing::{Endpoint, EndpointMetadata, RoutePattern, RouteValues};
    use crate::tenants::{Tenant, TenantSet};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    struct StaticViews;

    impl ViewEngine for StaticViews {
        fn render<'a>(
            &'a self,
            tenant: &'a crate::tenants::Tenant,
            controller: &'a str,
            view: &'a str,
            model: &'a Value,
        ) -> BoxFuture<'a, Result<String, ViewError>> {
            Box::pin(async move {
                if view == "Missing" {
                    return Err(ViewError::NotFound {
                        view: view.to_string(),
                        searched: vec![],
                    });
                }
                Ok(format!("{}:{}/{}:{}", tenant.short_identifier, controller, view, model["title"]))
            })
        }
    }

    fn dispatcher() -> Arc<Dispatcher> {
        let tenants = TenantSet::new(vec![Tenant {
            name: "Alpha".into(),
            identifier: "alpha".into(),
            short_identifier: "alp".into(),
            host: "a.example".into(),
        }])
        .unwrap();
        let controllers = ControllerRegistry::new().register(
            Controller::new("Home")
                .action("Index", |_| ActionResult::view(json!({"title": "home"})))
                .action("Gone", |_| ActionResult::NotFound)
                .action("Broken", |_| ActionResult::View {
                    name: Some("Missing".into()),
                    model: json!({}),
                }),
        );
        Arc::new(Dispatcher::new(
            Arc::new(TenantRegistry::new(tenants)),
            controllers,
            Arc::new(StaticViews),
        ))
    }

    fn make_route(dispatcher: &Arc<Dispatcher>, controller: Option<&str>, action: Option<&str>) -> RouteMatch {
        route_for(dispatcher, EndpointMetadata::default(), controller, action)
    }

    fn route_for(
        dispatcher: &Arc<Dispatcher>,
        metadata: EndpointMetadata,
        controller: Option<&str>,
        action: Option<&str>,
    ) -> RouteMatch {
        let handler: Arc<dyn EndpointHandler> = dispatcher.clone();
        let endpoint = Endpoint::new(
            RoutePattern::parse("/{lang}").unwrap(),
            vec![],
            BTreeMap::new(),
            0,
            metadata,
            handler,
        );
        let mut values = RouteValues::default();
        if let Some(controller) = controller {
            values.insert("controller", controller);
        }
        if let Some(action) = action {
            values.insert("action", action);
        }
        RouteMatch {
            endpoint: Arc::new(endpoint),
            values,
        }
    }

    async fn call(host: &str, controller: Option<&str>, action: Option<&str>) -> (StatusCode, String) {
        let dispatcher = dispatcher();
        let route = make_route(&dispatcher, controller, action);
        call_route(dispatcher, route, host).await
    }

    async fn call_route(dispatcher: Arc<Dispatcher>, route: RouteMatch, host: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri("/en")
            .header("Host", host)
            .body(Body::empty())
            .unwrap();
        let response = dispatcher.handle(request, route).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_renders_view_for_tenant() {
        let (status, body) = call("A.EXAMPLE", Some("home"), Some("index")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alp:Home/Index:\"home\"");
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_server_error() {
        let (status, body) = call("b.example", Some("Home"), Some("Index")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "DomainApp b.example does not exist.");
    }

    #[tokio::test]
    async fn test_not_found_conditions() {
        let cases = [
            (Some("Home"), None, "Controller or Action not specified"),
            (Some(" "), Some("Index"), "Controller or Action not specified"),
            (Some("About"), Some("Index"), "Controller not found"),
            (Some("Home"), Some("Nope"), "Action not found"),
            (Some("Home"), Some("Broken"), "View not found"),
            (Some("Home"), Some("Gone"), "Not found"),
        ];

        for (controller, action, expected) in cases {
            let (status, body) = call("a.example", controller, action).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{controller:?}/{action:?}");
            assert_eq!(body, expected);
        }
    }

    #[tokio::test]
    async fn test_endpoint_tenant_wins_over_registry() {
        // registered with the table before the registry knows the host
        let dispatcher = dispatcher();
        let gamma = Arc::new(Tenant {
            name: "Gamma".into(),
            identifier: "gamma".into(),
            short_identifier: "gam".into(),
            host: "g.example".into(),
        });
        let metadata = EndpointMetadata {
            host: Some("g.example".into()),
            tenant: Some(gamma),
        };
        let route = route_for(&dispatcher, metadata, Some("Home"), Some("Index"));

        let (status, body) = call_route(dispatcher, route, "g.example").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "gam:Home/Index:\"home\"");
    }
}
