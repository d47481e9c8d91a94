//! Pure locale resolution over request metadata.

use crate::locale::table::LocaleTable;

/// Outcome of resolving a request's locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleDecision {
    /// The path already starts with a canonical, enabled locale.
    Resolved(String),
    /// Issue a 301 to this location.
    Redirect(String),
}

/// Resolve the effective locale for `path`.
///
/// `query` is the raw query string without the leading `?`.
pub fn resolve(
    table: &LocaleTable,
    path: &str,
    query: Option<&str>,
    accept_language: Option<&str>,
) -> LocaleDecision {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(first) = segments.first() {
        if table.is_enabled(first) {
            let lowered = first.to_ascii_lowercase();
            if lowered != *first {
                let mut rewritten = vec![lowered.as_str()];
                rewritten.extend_from_slice(&segments[1..]);
                return LocaleDecision::Redirect(build_location(&rewritten, query));
            }
            return LocaleDecision::Resolved(lowered);
        }
    }

    let lang = preferred_locale(table, accept_language);
    let mut prefixed = vec![lang];
    prefixed.extend_from_slice(&segments);
    LocaleDecision::Redirect(build_location(&prefixed, query))
}

/// The first Accept-Language tag's two-letter prefix if enabled, else the default.
fn preferred_locale<'a>(table: &'a LocaleTable, accept_language: Option<&str>) -> &'a str {
    let candidate = accept_language
        .and_then(|header| header.split(',').next())
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.chars().take(2).collect::<String>().to_ascii_lowercase());

    match candidate {
        Some(code) if table.is_enabled(&code) => table
            .enabled_codes()
            .iter()
            .find(|enabled| **enabled == code)
            .map(String::as_str)
            .unwrap_or(table.default_code()),
        _ => table.default_code(),
    }
}

fn build_location(segments: &[&str], query: Option<&str>) -> String {
    let mut location = format!("/{}", segments.join("/"));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
    location
}
