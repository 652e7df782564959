//! Path template helpers for `/posts/:id` style routes.
//!
//! A segment starting with `:` is a named parameter; a trailing `?` makes it
//! optional (`/files/:name?`).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Static(String),
    Param { name: String, optional: bool },
}

/// Split a template into its segments. Empty segments are dropped.
pub fn parse_template(path: &str) -> Vec<PathSegment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(param) => match param.strip_suffix('?') {
                Some(name) => PathSegment::Param {
                    name: name.to_string(),
                    optional: true,
                },
                None => PathSegment::Param {
                    name: param.to_string(),
                    optional: false,
                },
            },
            None => PathSegment::Static(segment.to_string()),
        })
        .collect()
}

/// Names of the parameters declared by a template, in order.
pub fn param_names(path: &str) -> Vec<String> {
    parse_template(path)
        .into_iter()
        .filter_map(|s| match s {
            PathSegment::Param { name, .. } => Some(name),
            PathSegment::Static(_) => None,
        })
        .collect()
}

/// Reason a template is malformed, if it is.
pub(crate) fn template_problem(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return Some("must start with '/'".to_string());
    }
    let mut seen = Vec::new();
    for segment in parse_template(path) {
        if let PathSegment::Param { name, .. } = segment {
            if name.is_empty() {
                return Some("empty parameter name".to_string());
            }
            if seen.contains(&name) {
                return Some(format!("parameter ':{name}' declared twice"));
            }
            seen.push(name);
        }
    }
    None
}

/// A required path parameter had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPathParam {
    pub name: String,
}

impl fmt::Display for MissingPathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing value for path parameter ':{}'", self.name)
    }
}

impl std::error::Error for MissingPathParam {}

/// Substitute parameter values into a template, percent-encoding each value.
///
/// Optional parameters without a value drop their segment entirely.
///
/// ```rust
/// use contract_router::contract::path::insert_params;
///
/// let url = insert_params("/posts/:id/comments/:page?", |name| match name {
///     "id" => Some("a b".to_string()),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(url, "/posts/a%20b/comments");
/// ```
pub fn insert_params<F>(path: &str, lookup: F) -> Result<String, MissingPathParam>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(path.len());
    for segment in parse_template(path) {
        match segment {
            PathSegment::Static(s) => {
                out.push('/');
                out.push_str(&s);
            }
            PathSegment::Param { name, optional } => match lookup(&name) {
                Some(value) => {
                    out.push('/');
                    out.push_str(&urlencoding::encode(&value));
                }
                None if optional => {}
                None => return Err(MissingPathParam { name }),
            },
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// Join two path fragments with exactly one `/` between them.
pub fn join(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.is_empty() || path == "/" {
        if prefix.is_empty() {
            return "/".to_string();
        }
        return prefix.to_string();
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}
