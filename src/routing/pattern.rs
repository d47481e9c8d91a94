//! Route pattern parsing and structural matching.
//!
//! # Syntax
//! ```text
//! /{lang:SupportedLocals}/resource/{level1Category}/{*slug}
//! /{lang:SupportedLocals}/{controller=Home}/{action=Index}
//! ```
//! - `literal`: matched ASCII case-insensitively
//! - `{name}`: required parameter
//! - `{name?}`: optional parameter
//! - `{name=default}`: parameter with a default value
//! - `{name:constraint}` / `{name:constraint=default}`: constrained parameter
//! - `{*name}` / `{**name}`: catch-all, last segment only
//!
//! A segment is either all literal or a single parameter.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unbalanced braces in segment '{0}'")]
    UnbalancedBraces(String),

    #[error("segment '{0}' mixes literal text and a parameter")]
    ComplexSegment(String),

    #[error("empty parameter name in segment '{0}'")]
    EmptyParameterName(String),

    #[error("catch-all parameter '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    #[error("optional parameter '{0}' cannot have a default value")]
    OptionalWithDefault(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<String>,
    pub constraint: Option<String>,
    pub optional: bool,
    pub catch_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Literal(String),
    Parameter(Parameter),
}

/// A parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names = HashSet::new();

        for (index, part) in parts.iter().enumerate() {
            let segment = parse_segment(part)?;
            if let PatternSegment::Parameter(param) = &segment {
                if param.catch_all && index + 1 != parts.len() {
                    return Err(PatternError::CatchAllNotLast(param.name.clone()));
                }
                if !names.insert(param.name.to_ascii_lowercase()) {
                    return Err(PatternError::DuplicateParameter(param.name.clone()));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.segments.iter().filter_map(|s| match s {
            PatternSegment::Parameter(p) => Some(p),
            PatternSegment::Literal(_) => None,
        })
    }

    /// Names of every constraint referenced by the pattern.
    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.parameters().filter_map(|p| p.constraint.as_deref())
    }

    /// Structurally match `path`, returning captured values (defaults included).
    ///
    /// Constraints are not evaluated here.
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut values = Vec::new();
        let mut cursor = 0;

        for segment in &self.segments {
            match segment {
                PatternSegment::Literal(literal) => {
                    let actual = path_segments.get(cursor)?;
                    if !actual.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                    cursor += 1;
                }
                PatternSegment::Parameter(param) if param.catch_all => {
                    let rest = path_segments.get(cursor..).unwrap_or_default();
                    cursor = path_segments.len();
                    if !rest.is_empty() {
                        values.push((param.name.clone(), rest.join("/")));
                    } else if let Some(default) = &param.default {
                        values.push((param.name.clone(), default.clone()));
                    }
                }
                PatternSegment::Parameter(param) => match path_segments.get(cursor) {
                    Some(actual) => {
                        values.push((param.name.clone(), (*actual).to_string()));
                        cursor += 1;
                    }
                    None => match &param.default {
                        Some(default) => values.push((param.name.clone(), default.clone())),
                        None if param.optional => {}
                        None => return None,
                    },
                },
            }
        }

        if cursor < path_segments.len() {
            return None;
        }
        Some(values)
    }
}

fn parse_segment(part: &str) -> Result<PatternSegment, PatternError> {
    let opens = part.matches('{').count();
    let closes = part.matches('}').count();
    if opens != closes || opens > 1 {
        return Err(if opens != closes {
            PatternError::UnbalancedBraces(part.to_string())
        } else {
            PatternError::ComplexSegment(part.to_string())
        });
    }
    if opens == 0 {
        return Ok(PatternSegment::Literal(part.to_string()));
    }
    if !(part.starts_with('{') && part.ends_with('}')) {
        return Err(PatternError::ComplexSegment(part.to_string()));
    }

    let inner = &part[1..part.len() - 1];
    let (catch_all, inner) = if let Some(rest) = inner.strip_prefix("**") {
        (true, rest)
    } else if let Some(rest) = inner.strip_prefix('*') {
        (true, rest)
    } else {
        (false, inner)
    };

    let (head, default) = match inner.split_once('=') {
        Some((head, default)) => (head, Some(default.to_string())),
        None => (inner, None),
    };
    let (head, optional) = match head.strip_suffix('?') {
        Some(head) => (head, true),
        None => (head, false),
    };
    let (name, constraint) = match head.split_once(':') {
        Some((name, constraint)) => (name, Some(constraint.to_string())),
        None => (head, None),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(PatternError::EmptyParameterName(part.to_string()));
    }
    if optional && default.is_some() {
        return Err(PatternError::OptionalWithDefault(name.to_string()));
    }

    Ok(PatternSegment::Parameter(Parameter {
        name: name.to_string(),
        default,
        constraint: constraint.filter(|c| !c.is_empty()),
        optional,
        catch_all,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        RoutePattern::parse(pattern).unwrap().match_path(path)
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_default_pattern() {
        let pattern = RoutePattern::parse("/{lang:SupportedLocals}/{controller=Home}/{action=Index}").unwrap();
        let params: Vec<_> = pattern.parameters().collect();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].constraint.as_deref(), Some("SupportedLocals"));
        assert_eq!(params[1].default.as_deref(), Some("Home"));
        assert_eq!(pattern.constraint_names().collect::<Vec<_>>(), ["SupportedLocals"]);
    }

    #[test]
    fn test_defaults_fill_missing_segments() {
        let pattern = "/{lang}/{controller=Home}/{action=Index}";
        assert_eq!(
            values(pattern, "/en"),
            Some(pairs(&[("lang", "en"), ("controller", "Home"), ("action", "Index")]))
        );
        assert_eq!(
            values(pattern, "/en/about"),
            Some(pairs(&[("lang", "en"), ("controller", "about"), ("action", "Index")]))
        );
        assert_eq!(values(pattern, "/en/a/b/c"), None);
        assert_eq!(values(pattern, "/"), None);
    }

    #[test]
    fn test_literals_are_case_insensitive() {
        let pattern = "/{lang}/resource/{category}/{*slug}";
        assert_eq!(
            values(pattern, "/en/Resource/books/rust/async"),
            Some(pairs(&[("lang", "en"), ("category", "books"), ("slug", "rust/async")]))
        );
        assert_eq!(
            values(pattern, "/en/resource/books"),
            Some(pairs(&[("lang", "en"), ("category", "books")]))
        );
        assert_eq!(values(pattern, "/en/other/books"), None);
    }

    #[test]
    fn test_optional_parameter() {
        assert_eq!(values("/{controller}/{id?}", "/home"), Some(pairs(&[("controller", "home")])));
        assert_eq!(
            values("/{controller}/{id?}", "/home/7"),
            Some(pairs(&[("controller", "home"), ("id", "7")]))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            RoutePattern::parse("/{lang").unwrap_err(),
            PatternError::UnbalancedBraces("{lang".into())
        );
        assert_eq!(
            RoutePattern::parse("/page-{id}").unwrap_err(),
            PatternError::ComplexSegment("page-{id}".into())
        );
        assert_eq!(
            RoutePattern::parse("/{*rest}/tail").unwrap_err(),
            PatternError::CatchAllNotLast("rest".into())
        );
        assert_eq!(
            RoutePattern::parse("/{id}/{ID}").unwrap_err(),
            PatternError::DuplicateParameter("ID".into())
        );
        assert_eq!(
            RoutePattern::parse("/{:x}").unwrap_err(),
            PatternError::EmptyParameterName("{:x}".into())
        );
        assert_eq!(
            RoutePattern::parse("/{id?=1}").unwrap_err(),
            PatternError::OptionalWithDefault("id".into())
        );
    }
}
