use crate::contract::path::{parse_template, PathSegment};
use crate::contract::HttpMethod;
use crate::resolver::ResolvedRoute;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted path parameters; names are shared with the compiled table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A resolved route matched against a concrete path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub entry: &'a ResolvedRoute,
    /// Percent-decoded values, in template order
    pub path_params: ParamVec,
}

impl RouteMatch<'_> {
    /// Get a path parameter by name
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A path template could not be compiled into a matcher.
#[derive(Debug)]
pub struct RouteTableError {
    pub path: String,
    pub source: regex::Error,
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to compile route pattern for {}: {}", self.path, self.source)
    }
}

impl std::error::Error for RouteTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug)]
struct CompiledRoute {
    method: HttpMethod,
    regex: Regex,
    params: Vec<Arc<str>>,
    entry: ResolvedRoute,
}

/// Method + path matcher over resolved routes.
///
/// Routes are tried in resolution order; the first match wins.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(entries: Vec<ResolvedRoute>) -> Result<Self, RouteTableError> {
        let mut routes = Vec::with_capacity(entries.len());
        for entry in entries {
            let (regex, params) =
                path_to_regex(&entry.route.path).map_err(|source| RouteTableError {
                    path: entry.route.path.clone(),
                    source,
                })?;
            routes.push(CompiledRoute {
                method: entry.route.method,
                regex,
                params: params.into_iter().map(Arc::from).collect(),
                entry,
            });
        }

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| r.entry.route.label())
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ResolvedRoute> {
        self.routes.iter().map(|r| &r.entry)
    }

    /// Match `path` (query string ignored) for `method`.
    #[must_use]
    pub fn route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        self.routes
            .iter()
            .filter(|r| r.method == method)
            .find_map(|r| {
                let captures = r.regex.captures(path)?;
                let mut path_params = ParamVec::new();
                for (i, name) in r.params.iter().enumerate() {
                    if let Some(m) = captures.get(i + 1) {
                        let value = urlencoding::decode(m.as_str())
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| m.as_str().to_string());
                        path_params.push((Arc::clone(name), value));
                    }
                }
                Some(RouteMatch {
                    entry: &r.entry,
                    path_params,
                })
            })
    }
}

/// Convert a `:name` template into an anchored regex and its parameter names.
///
/// `/posts/:id/files/:name?` becomes `^/posts/([^/]+)/files(?:/([^/]+))?$`.
/// A template made only of optional parameters also matches `/`.
pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
    let segments = parse_template(path);
    if segments.is_empty() {
        return Ok((Regex::new(r"^/$")?, Vec::new()));
    }
    let all_optional = segments
        .iter()
        .all(|s| matches!(s, PathSegment::Param { optional: true, .. }));

    let mut pattern = String::with_capacity(path.len() + 16);
    pattern.push('^');
    let mut names = Vec::new();
    for segment in segments {
        match segment {
            PathSegment::Static(s) => {
                pattern.push('/');
                pattern.push_str(&regex::escape(&s));
            }
            PathSegment::Param {
                name,
                optional: false,
            } => {
                pattern.push_str("/([^/]+)");
                names.push(name);
            }
            PathSegment::Param {
                name,
                optional: true,
            } => {
                pattern.push_str("(?:/([^/]+))?");
                names.push(name);
            }
        }
    }
    if all_optional {
        pattern.push_str("|/");
        pattern.insert_str(1, "(?:");
        pattern.push(')');
    }
    pattern.push('$');
    Ok((Regex::new(&pattern)?, names))
}
