//! Per-tenant view location and rendering.
//!
//! # Lookup Order
//! ```text
//! <root>/<short_identifier>/Views/<Controller>/<view>.html
//! <root>/<short_identifier>/Views/Shared/<view>.html
//! ```

use std::io;
use std::path::PathBuf;

use dashmap::DashMap;
use serde_json::Value;

use crate::routing::BoxFuture;
use crate::tenants::Tenant;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("view '{view}' not found, searched: {}", .searched.join(", "))]
    NotFound { view: String, searched: Vec<String> },

    #[error("failed to read view {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Locates and renders a view for a tenant.
pub trait ViewEngine: Send + Sync {
    fn render<'a>(
        &'a self,
        tenant: &'a Tenant,
        controller: &'a str,
        view: &'a str,
        model: &'a Value,
    ) -> BoxFuture<'a, Result<String, ViewError>>;
}

/// Views as `.html` files on disk with `{{key}}` placeholders.
#[derive(Debug)]
pub struct FileViewEngine {
    root: PathBuf,
    /// (tenant, controller, view), lower-cased → resolved file.
    locations: DashMap<(String, String, String), PathBuf>,
}

impl FileViewEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locations: DashMap::new(),
        }
    }

    fn candidates(&self, tenant: &Tenant, controller: &str, view: &str) -> Vec<PathBuf> {
        let views = self.root.join(&tenant.short_identifier).join("Views");
        let file = format!("{}.html", view);
        vec![views.join(controller).join(&file), views.join("Shared").join(&file)]
    }

    async fn locate(&self, tenant: &Tenant, controller: &str, view: &str) -> Result<PathBuf, ViewError> {
        let key = (
            tenant.short_identifier.to_ascii_lowercase(),
            controller.to_ascii_lowercase(),
            view.to_ascii_lowercase(),
        );
        if let Some(path) = self.locations.get(&key) {
            return Ok(path.clone());
        }

        let candidates = self.candidates(tenant, controller, view);
        for candidate in &candidates {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                self.locations.insert(key, candidate.clone());
                return Ok(candidate.clone());
            }
        }

        Err(ViewError::NotFound {
            view: view.to_string(),
            searched: candidates.iter().map(|p| p.display().to_string()).collect(),
        })
    }

    async fn render_file(
        &self,
        tenant: &Tenant,
        controller: &str,
        view: &str,
        model: &Value,
    ) -> Result<String, ViewError> {
        let path = self.locate(tenant, controller, view).await?;
        match tokio::fs::read_to_string(&path).await {
            Ok(template) => Ok(substitute(&template, model)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // deleted since it was located
                self.locations.retain(|_, cached| *cached != path);
                Err(ViewError::NotFound {
                    view: view.to_string(),
                    searched: vec![path.display().to_string()],
                })
            }
            Err(source) => Err(ViewError::Io { path, source }),
        }
    }
}

impl ViewEngine for FileViewEngine {
    fn render<'a>(
        &'a self,
        tenant: &'a Tenant,
        controller: &'a str,
        view: &'a str,
        model: &'a Value,
    ) -> BoxFuture<'a, Result<String, ViewError>> {
        Box::pin(self.render_file(tenant, controller, view, model))
    }
}

/// Replace `{{key}}` with the HTML-escaped top-level scalar `model[key]`.
/// Unknown keys and non-scalar values render empty.
fn substitute(template: &str, model: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = after[..close].trim();
        match model.get(key) {
            Some(Value::String(s)) => escape_html(s, &mut out),
            Some(Value::Number(n)) => out.push_str(&n.to_string()),
            Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
            _ => {}
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

fn escape_html(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}
