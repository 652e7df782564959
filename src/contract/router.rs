use super::error::ContractError;
use super::path;
use super::route::{check_status, AppRoute, ResponseSpec};
use crate::schema::{MergedSchema, SchemaRef};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Either a leaf route or a nested router; never both.
#[derive(Debug, Clone)]
pub enum ContractNode {
    Route(Arc<AppRoute>),
    Router(ContractRouter),
}

impl ContractNode {
    pub fn as_route(&self) -> Option<&Arc<AppRoute>> {
        match self {
            ContractNode::Route(route) => Some(route),
            ContractNode::Router(_) => None,
        }
    }

    pub fn as_router(&self) -> Option<&ContractRouter> {
        match self {
            ContractNode::Router(router) => Some(router),
            ContractNode::Route(_) => None,
        }
    }
}

/// Options applied to every route nested below a router.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Prepended to each nested route path; composes across nesting levels
    pub path_prefix: Option<String>,
    /// Merged into each route's responses; a route's own entry wins
    pub common_responses: BTreeMap<u16, ResponseSpec>,
    /// Combined with each route's header schema
    pub base_headers: Option<SchemaRef>,
}

impl RouterOptions {
    pub fn is_empty(&self) -> bool {
        self.path_prefix.is_none() && self.common_responses.is_empty() && self.base_headers.is_none()
    }
}

/// Named grouping of routes and sub-routers, in declaration order.
///
/// ```rust
/// use contract_router::contract::{AppRoute, ContractRouter};
///
/// let contract = ContractRouter::new()
///     .route("health", AppRoute::get("/health").response_unchecked(200).build().unwrap())
///     .router(
///         "posts",
///         ContractRouter::new()
///             .route("list", AppRoute::get("/posts").response_unchecked(200).build().unwrap()),
///     );
/// assert_eq!(contract.route_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContractRouter {
    children: IndexMap<String, ContractNode>,
}

impl ContractRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: impl Into<String>, route: AppRoute) -> Self {
        self.insert(key, ContractNode::Route(Arc::new(route)));
        self
    }

    pub fn router(mut self, key: impl Into<String>, router: ContractRouter) -> Self {
        self.insert(key, ContractNode::Router(router));
        self
    }

    /// Insert or replace a child, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, node: ContractNode) {
        self.children.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&ContractNode> {
        self.children.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up a route by its key path, e.g. `["posts", "get"]`.
    pub fn find(&self, keys: &[&str]) -> Option<&Arc<AppRoute>> {
        let (last, parents) = keys.split_last()?;
        let mut router = self;
        for key in parents {
            router = router.get(key)?.as_router()?;
        }
        router.get(last)?.as_route()
    }

    /// Number of leaf routes at any depth.
    pub fn route_count(&self) -> usize {
        self.children
            .values()
            .map(|node| match node {
                ContractNode::Route(_) => 1,
                ContractNode::Router(router) => router.route_count(),
            })
            .sum()
    }

    /// Every leaf route with its key path, depth first in declaration order.
    pub fn flatten(&self) -> Vec<(Vec<String>, Arc<AppRoute>)> {
        let mut out = Vec::with_capacity(self.route_count());
        self.flatten_into(&mut Vec::new(), &mut out);
        out
    }

    fn flatten_into(&self, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, Arc<AppRoute>)>) {
        for (key, node) in &self.children {
            prefix.push(key.clone());
            match node {
                ContractNode::Route(route) => out.push((prefix.clone(), Arc::clone(route))),
                ContractNode::Router(router) => router.flatten_into(prefix, out),
            }
            prefix.pop();
        }
    }

    /// Apply `options` to every nested route.
    pub fn with_options(self, options: &RouterOptions) -> Result<Self, ContractError> {
        if options.is_empty() {
            return Ok(self);
        }
        if let Some(prefix) = &options.path_prefix {
            if let Some(reason) = path::template_problem(&path::join(prefix, "/")) {
                return Err(ContractError::InvalidPath {
                    route: format!("pathPrefix {prefix}"),
                    reason,
                });
            }
        }
        for status in options.common_responses.keys() {
            check_status("commonResponses", *status)?;
        }
        self.map_routes(&|route| apply_options(route, options))
    }

    fn map_routes<F>(self, f: &F) -> Result<Self, ContractError>
    where
        F: Fn(&AppRoute) -> Result<AppRoute, ContractError>,
    {
        let mut children = IndexMap::with_capacity(self.children.len());
        for (key, node) in self.children {
            let node = match node {
                ContractNode::Route(route) => ContractNode::Route(Arc::new(f(&route)?)),
                ContractNode::Router(router) => ContractNode::Router(router.map_routes(f)?),
            };
            children.insert(key, node);
        }
        Ok(Self { children })
    }
}

fn apply_options(route: &AppRoute, options: &RouterOptions) -> Result<AppRoute, ContractError> {
    let mut route = route.clone();
    if let Some(prefix) = &options.path_prefix {
        route.path = path::join(prefix, &route.path);
    }
    for (status, spec) in &options.common_responses {
        route.responses.entry(*status).or_insert_with(|| spec.clone());
    }
    if let Some(base) = &options.base_headers {
        route.headers = Some(match route.headers.take() {
            Some(own) => Arc::new(MergedSchema::new(vec![Arc::clone(base), own])),
            None => Arc::clone(base),
        });
    }
    route.validate()?;
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FnSchema, ParseOptions, Schema};
    use serde_json::{json, Value};

    fn unchecked_get(path: &str) -> AppRoute {
        AppRoute::get(path).response_unchecked(200).build().unwrap()
    }

    fn nested() -> ContractRouter {
        ContractRouter::new()
            .route("health", unchecked_get("/health"))
            .router(
                "posts",
                ContractRouter::new()
                    .route("list", unchecked_get("/posts"))
                    .router(
                        "comments",
                        ContractRouter::new().route("list", unchecked_get("/posts/:id/comments")),
                    ),
            )
    }

    #[test]
    fn flatten_preserves_declaration_order() {
        let keys: Vec<String> = nested()
            .flatten()
            .into_iter()
            .map(|(k, _)| k.join("."))
            .collect();
        assert_eq!(keys, vec!["health", "posts.list", "posts.comments.list"]);
    }

    #[test]
    fn find_walks_key_paths() {
        let contract = nested();
        let route = contract.find(&["posts", "comments", "list"]).unwrap();
        assert_eq!(route.path, "/posts/:id/comments");
        assert!(contract.find(&["posts"]).is_none());
        assert!(contract.find(&["missing", "list"]).is_none());
    }

    #[test]
    fn path_prefix_composes_across_levels() {
        let inner = nested()
            .with_options(&RouterOptions {
                path_prefix: Some("/v1".into()),
                ..Default::default()
            })
            .unwrap();
        let outer = ContractRouter::new()
            .router("api", inner)
            .with_options(&RouterOptions {
                path_prefix: Some("/api".into()),
                ..Default::default()
            })
            .unwrap();
        let route = outer.find(&["api", "posts", "list"]).unwrap();
        assert_eq!(route.path, "/api/v1/posts");
    }

    #[test]
    fn common_responses_do_not_override_route_entries() {
        let contract = ContractRouter::new()
            .route(
                "get",
                AppRoute::get("/x").response_no_body(404).build().unwrap(),
            )
            .with_options(&RouterOptions {
                common_responses: BTreeMap::from([
                    (404, ResponseSpec::Unchecked),
                    (500, ResponseSpec::Unchecked),
                ]),
                ..Default::default()
            })
            .unwrap();
        let route = contract.find(&["get"]).unwrap();
        assert!(matches!(route.response(404), Some(ResponseSpec::NoBody)));
        assert!(matches!(route.response(500), Some(ResponseSpec::Unchecked)));
    }

    #[test]
    fn base_headers_merge_with_route_headers() {
        let require = |name: &'static str| -> SchemaRef {
            Arc::new(FnSchema::new(name, move |v: &Value| {
                v.get(name)
                    .map(|h| json!({ name: h }))
                    .ok_or_else(|| crate::schema::SchemaError::message(format!("{name} missing")))
            }))
        };
        let route = AppRoute::get("/x")
            .headers(require("x-route"))
            .response_unchecked(200)
            .build()
            .unwrap();
        let contract = ContractRouter::new()
            .route("x", route)
            .with_options(&RouterOptions {
                base_headers: Some(require("authorization")),
                ..Default::default()
            })
            .unwrap();
        let headers = contract.find(&["x"]).unwrap().headers.clone().unwrap();
        let out = headers
            .parse(
                &json!({ "authorization": "t", "x-route": "r", "host": "h" }),
                ParseOptions::strict(),
            )
            .unwrap();
        assert_eq!(out, json!({ "authorization": "t", "x-route": "r" }));
        assert!(headers
            .parse(&json!({ "x-route": "r" }), ParseOptions::strict())
            .is_err());
    }

    #[test]
    fn invalid_common_status_is_rejected() {
        let err = nested()
            .with_options(&RouterOptions {
                common_responses: BTreeMap::from([(1000, ResponseSpec::Unchecked)]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidStatusCode { status: 1000, .. }));
    }
}
