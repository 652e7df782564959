use crate::contract::{AppRoute, ContractNode, ContractRouter};
use crate::dispatcher::RouteHandler;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Implementation tree mirroring a contract.
#[derive(Debug, Clone)]
pub enum ImplNode {
    /// Leaf handler for a contract route
    Handler(RouteHandler),
    /// Nested implementation for a contract router
    Router(ImplRouter),
    /// Sub-router already paired with its own contract
    Initialised(InitialisedRouter),
}

/// Keyed implementation nodes, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ImplRouter {
    children: IndexMap<String, ImplNode>,
}

impl ImplRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, key: impl Into<String>, handler: RouteHandler) -> Self {
        self.insert(key, ImplNode::Handler(handler));
        self
    }

    pub fn router(mut self, key: impl Into<String>, router: ImplRouter) -> Self {
        self.insert(key, ImplNode::Router(router));
        self
    }

    pub fn initialised(mut self, key: impl Into<String>, router: InitialisedRouter) -> Self {
        self.insert(key, ImplNode::Initialised(router));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, node: ImplNode) {
        self.children.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&ImplNode> {
        self.children.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImplNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A contract and its implementation bundled together, so a sub-API can be
/// built once and mounted under a key of a larger router.
#[derive(Debug, Clone)]
pub struct InitialisedRouter {
    pub contract: ContractRouter,
    pub routes: ImplRouter,
}

impl InitialisedRouter {
    pub fn new(contract: ContractRouter, routes: ImplRouter) -> Self {
        Self { contract, routes }
    }

    /// Resolve the bundle as a root router; prefixes start at its own keys.
    pub fn resolve(&self) -> Result<Vec<ResolvedRoute>, ResolveError> {
        resolve(&self.contract, &self.routes)
    }
}

/// A contract route paired with its handler, computed once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// Keys from the root router down to the route
    pub prefix: Vec<String>,
    pub route: Arc<AppRoute>,
    pub handler: RouteHandler,
}

impl ResolvedRoute {
    /// Dotted key, e.g. `posts.get`
    pub fn operation(&self) -> String {
        self.prefix.join(".")
    }
}

/// What exactly did not line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The implementation has a key the contract does not declare
    UnknownKey,
    /// A contract key has no implementation
    MissingImplementation,
    /// The contract declares a route here but the implementation is a router
    ExpectedHandler,
    /// The contract declares a router here but the implementation is a handler
    ExpectedRouter,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mismatch::UnknownKey => "implementation key is not part of the contract",
            Mismatch::MissingImplementation => "contract key has no implementation",
            Mismatch::ExpectedHandler => "contract declares a route, implementation is a router",
            Mismatch::ExpectedRouter => "contract declares a router, implementation is a handler",
        })
    }
}

/// Implementation and contract trees do not have the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    StructuralMismatch { path: Vec<String>, kind: Mismatch },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::StructuralMismatch { path, kind } => {
                write!(f, "structural mismatch at '{}': {kind}", path.join("."))
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Pair every contract route with its handler.
///
/// Produces exactly one entry per leaf route, in contract declaration order.
/// Any difference in keys or route/router placement is a
/// [`ResolveError::StructuralMismatch`]. Use [`InitialisedRouter::resolve`]
/// when the root itself is an already bundled router.
pub fn resolve(
    contract: &ContractRouter,
    implementation: &ImplRouter,
) -> Result<Vec<ResolvedRoute>, ResolveError> {
    let mut resolved = Vec::with_capacity(contract.route_count());
    let mut prefix = Vec::new();
    if let Err(err) = walk(contract, implementation, &mut prefix, &mut resolved) {
        error!(error = %err, "Contract resolution failed");
        return Err(err);
    }

    warn_duplicate_endpoints(&resolved);
    info!(routes_count = resolved.len(), "Contract resolved");
    Ok(resolved)
}

fn walk(
    contract: &ContractRouter,
    implementation: &ImplRouter,
    prefix: &mut Vec<String>,
    out: &mut Vec<ResolvedRoute>,
) -> Result<(), ResolveError> {
    if let Some((key, _)) = implementation
        .iter()
        .find(|(key, _)| contract.get(key).is_none())
    {
        return Err(mismatch(prefix, key, Mismatch::UnknownKey));
    }

    for (key, node) in contract.iter() {
        let Some(imp) = implementation.get(key) else {
            return Err(mismatch(prefix, key, Mismatch::MissingImplementation));
        };
        prefix.push(key.to_string());
        match (node, imp) {
            (ContractNode::Router(_), ImplNode::Initialised(inner)) => {
                walk(&inner.contract, &inner.routes, prefix, out)?;
            }
            (ContractNode::Router(sub), ImplNode::Router(sub_impl)) => {
                walk(sub, sub_impl, prefix, out)?;
            }
            (ContractNode::Route(route), ImplNode::Handler(handler)) => {
                debug!(
                    operation = %prefix.join("."),
                    method = %route.method,
                    path = %route.path,
                    "Route resolved"
                );
                out.push(ResolvedRoute {
                    prefix: prefix.clone(),
                    route: Arc::clone(route),
                    handler: handler.clone(),
                });
            }
            (ContractNode::Route(_), _) => {
                return Err(ResolveError::StructuralMismatch {
                    path: prefix.clone(),
                    kind: Mismatch::ExpectedHandler,
                });
            }
            (ContractNode::Router(_), ImplNode::Handler(_)) => {
                return Err(ResolveError::StructuralMismatch {
                    path: prefix.clone(),
                    kind: Mismatch::ExpectedRouter,
                });
            }
        }
        prefix.pop();
    }
    Ok(())
}

fn mismatch(prefix: &[String], key: &str, kind: Mismatch) -> ResolveError {
    let mut path = prefix.to_vec();
    path.push(key.to_string());
    ResolveError::StructuralMismatch { path, kind }
}

fn warn_duplicate_endpoints(resolved: &[ResolvedRoute]) {
    let mut seen: HashMap<(crate::contract::HttpMethod, &str), &ResolvedRoute> = HashMap::new();
    for entry in resolved {
        let key = (entry.route.method, entry.route.path.as_str());
        if let Some(first) = seen.get(&key) {
            warn!(
                method = %entry.route.method,
                path = %entry.route.path,
                first = %first.operation(),
                duplicate = %entry.operation(),
                "Duplicate method and path; the first route shadows the later one"
            );
        } else {
            seen.insert(key, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::HandlerResponse;

    fn route(path: &str) -> AppRoute {
        AppRoute::get(path).response_unchecked(200).build().unwrap()
    }

    fn handler() -> RouteHandler {
        RouteHandler::sync(|_| Ok(HandlerResponse::empty(200)))
    }

    fn contract() -> ContractRouter {
        ContractRouter::new()
            .route("health", route("/health"))
            .router(
                "posts",
                ContractRouter::new()
                    .route("list", route("/posts"))
                    .route("get", route("/posts/:id")),
            )
    }

    fn implementation() -> ImplRouter {
        ImplRouter::new()
            .router(
                "posts",
                ImplRouter::new()
                    .handler("get", handler())
                    .handler("list", handler()),
            )
            .handler("health", handler())
    }

    #[test]
    fn resolves_in_contract_order() {
        let resolved = resolve(&contract(), &implementation()).unwrap();
        let ops: Vec<String> = resolved.iter().map(ResolvedRoute::operation).collect();
        assert_eq!(ops, vec!["health", "posts.list", "posts.get"]);
        assert_eq!(resolved[2].route.path, "/posts/:id");
    }

    #[test]
    fn extra_implementation_key_is_a_mismatch() {
        let imp = implementation().handler("extra", handler());
        let err = resolve(&contract(), &imp).unwrap_err();
        assert_eq!(
            err,
            ResolveError::StructuralMismatch {
                path: vec!["extra".into()],
                kind: Mismatch::UnknownKey
            }
        );
    }

    #[test]
    fn missing_implementation_is_a_mismatch() {
        let imp = ImplRouter::new()
            .handler("health", handler())
            .router("posts", ImplRouter::new().handler("list", handler()));
        let err = resolve(&contract(), &imp).unwrap_err();
        assert_eq!(
            err,
            ResolveError::StructuralMismatch {
                path: vec!["posts".into(), "get".into()],
                kind: Mismatch::MissingImplementation
            }
        );
    }

    #[test]
    fn swapped_shapes_are_mismatches() {
        let imp = ImplRouter::new()
            .router("health", ImplRouter::new())
            .router("posts", ImplRouter::new());
        let err = resolve(&contract(), &imp).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::StructuralMismatch {
                kind: Mismatch::ExpectedHandler,
                ..
            }
        ));

        let imp = ImplRouter::new()
            .handler("health", handler())
            .handler("posts", handler());
        let err = resolve(&contract(), &imp).unwrap_err();
        assert_eq!(err.to_string(), format!("structural mismatch at 'posts': {}", Mismatch::ExpectedRouter));
    }

    #[test]
    fn initialised_router_keeps_the_prefix() {
        let posts_contract = ContractRouter::new().route("list", route("/posts"));
        let posts = InitialisedRouter::new(
            posts_contract.clone(),
            ImplRouter::new().handler("list", handler()),
        );
        let contract = ContractRouter::new().router("posts", posts_contract);
        let imp = ImplRouter::new().initialised("posts", posts);
        let resolved = resolve(&contract, &imp).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].prefix, vec!["posts", "list"]);
    }

    #[test]
    fn initialised_router_resolves_at_the_root() {
        let contract = ContractRouter::new()
            .route("health", route("/health"))
            .router("posts", ContractRouter::new().route("list", route("/posts")));
        let imp = ImplRouter::new()
            .handler("health", handler())
            .router("posts", ImplRouter::new().handler("list", handler()));
        let root = InitialisedRouter::new(contract.clone(), imp.clone());

        let resolved = root.resolve().unwrap();
        let direct = resolve(&contract, &imp).unwrap();
        let ops: Vec<String> = resolved.iter().map(ResolvedRoute::operation).collect();
        assert_eq!(ops, vec!["health", "posts.list"]);
        assert_eq!(ops, direct.iter().map(ResolvedRoute::operation).collect::<Vec<_>>());

        let partial = ImplRouter::new().handler("health", handler());
        let broken = InitialisedRouter::new(contract, partial);
        assert!(matches!(
            broken.resolve().unwrap_err(),
            ResolveError::StructuralMismatch {
                kind: Mismatch::MissingImplementation,
                ..
            }
        ));
    }
}
