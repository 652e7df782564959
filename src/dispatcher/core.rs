use crate::config::{ServerOptions, ValidationOverrides};
use crate::contract::{AppRoute, ContractRouter, HttpMethod};
use crate::request::{validate_request, RawRequest};
use crate::resolver::{resolve, ImplRouter, InitialisedRouter, ResolvedRoute};
use crate::response::{shape_response, ContractException, HandlerResponse, WireResponse};
use crate::router::{RouteMatch, RouteTable, RouteTableError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Validated request handed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub route: Arc<AppRoute>,
    /// Router keys from the contract root down to this route
    pub prefix: Vec<String>,
    pub method: HttpMethod,
    /// Concrete request path (not the template)
    pub path: String,
    pub params: Value,
    pub query: Value,
    pub headers: Value,
    pub body: Value,
}

impl HandlerRequest {
    /// Get a path parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a path parameter as a string slice
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_object()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_str())
    }

    /// Dotted key of the route, e.g. `posts.get`
    #[must_use]
    pub fn operation(&self) -> String {
        self.prefix.join(".")
    }
}

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<HandlerResponse>>;

type HandlerFn = dyn Fn(HandlerRequest) -> HandlerFuture + Send + Sync;

/// Handler for one contract route, plus its validation overrides.
///
/// Errors returned by the handler propagate to the caller of
/// [`Dispatcher::dispatch`], except a [`ContractException`] raised for the
/// same route, which becomes the response.
#[derive(Clone)]
pub struct RouteHandler {
    handler: Arc<HandlerFn>,
    overrides: ValidationOverrides,
}

impl RouteHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<HandlerResponse>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |req| f(req).boxed()),
            overrides: ValidationOverrides::default(),
        }
    }

    /// Wrap a synchronous handler.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        Self::new(move |req| futures::future::ready(f(req)))
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ValidationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn overrides(&self) -> &ValidationOverrides {
        &self.overrides
    }

    pub fn call(&self, req: HandlerRequest) -> HandlerFuture {
        (self.handler)(req)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    /// The handler ran and its response was shaped and sent
    Sent,
    /// A request or response validation error was turned into the response
    Errored,
}

/// Response produced by [`Dispatcher::dispatch`] and the state it ended in.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub response: WireResponse,
    pub final_state: DispatchState,
}

/// Failures the dispatcher does not turn into a response itself.
#[derive(Debug)]
pub enum DispatchError {
    /// The handler failed; the host framework's generic error path applies
    Handler(anyhow::Error),
    /// No route matches the method and path
    NotFound { method: HttpMethod, path: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler(err) => write!(f, "handler failed: {err:#}"),
            DispatchError::NotFound { method, path } => {
                write!(f, "no route matches {method} {path}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(err) => Some(err.as_ref()),
            DispatchError::NotFound { .. } => None,
        }
    }
}

/// Runs validate, invoke, shape for resolved routes.
///
/// Holds no mutable state; one dispatcher serves concurrent requests.
pub struct Dispatcher {
    table: RouteTable,
    options: ServerOptions,
}

impl Dispatcher {
    pub fn new(routes: Vec<ResolvedRoute>, options: ServerOptions) -> Result<Self, RouteTableError> {
        Ok(Self {
            table: RouteTable::new(routes)?,
            options,
        })
    }

    /// Resolve `implementation` against `contract` and build a dispatcher.
    pub fn from_router(
        contract: &ContractRouter,
        implementation: &ImplRouter,
        options: ServerOptions,
    ) -> anyhow::Result<Self> {
        let routes = resolve(contract, implementation)?;
        Ok(Self::new(routes, options)?)
    }

    /// Build a dispatcher whose root is an [`InitialisedRouter`].
    pub fn from_initialised(
        router: &InitialisedRouter,
        options: ServerOptions,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(router.resolve()?, options)?)
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn routes(&self) -> impl Iterator<Item = &ResolvedRoute> {
        self.table.entries()
    }

    /// Match a method and concrete path against the resolved routes.
    pub fn route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        self.table.route(method, path)
    }

    /// Route `raw` by method and path, then dispatch it.
    ///
    /// Path params extracted from the path are added to any the adapter
    /// already supplied.
    pub async fn handle(&self, mut raw: RawRequest) -> Result<DispatchOutcome, DispatchError> {
        let Some(matched) = self.table.route(raw.method, &raw.path) else {
            return Err(DispatchError::NotFound {
                method: raw.method,
                path: raw.path,
            });
        };
        for (name, value) in &matched.path_params {
            raw.path_params.insert(name.to_string(), value.clone());
        }
        self.dispatch(matched.entry, raw).await
    }

    /// Validate, invoke the handler at most once, then shape the response.
    pub async fn dispatch(
        &self,
        entry: &ResolvedRoute,
        raw: RawRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        let route = &entry.route;
        let overrides = entry.handler.overrides();

        // request validation
        let validation = self.options.validation_for(overrides);
        let validated = match validate_request(route, &raw, &validation) {
            Ok(validated) => validated,
            Err(err) => {
                let response = self
                    .options
                    .request_validation_error_handler
                    .respond(&err, route);
                return Ok(errored(response));
            }
        };

        // handler
        let request = HandlerRequest {
            route: Arc::clone(route),
            prefix: entry.prefix.clone(),
            method: raw.method,
            path: raw.path,
            params: validated.params,
            query: validated.query,
            headers: validated.headers,
            body: validated.body,
        };
        let response = match entry.handler.call(request).await {
            Ok(response) => response,
            Err(err) => match err.downcast::<ContractException>() {
                Ok(exception) if exception.is_for(route) => exception.into_response(),
                Ok(exception) => {
                    return Err(DispatchError::Handler(anyhow::Error::new(exception)))
                }
                Err(err) => return Err(DispatchError::Handler(err)),
            },
        };

        // response shaping
        let validate = self.options.validate_responses_for(overrides);
        match shape_response(route, response, validate) {
            Ok(wire) => Ok(DispatchOutcome {
                response: wire,
                final_state: DispatchState::Sent,
            }),
            Err(err) => {
                let response = self
                    .options
                    .response_validation_error_handler
                    .respond(&err, route);
                Ok(errored(response))
            }
        }
    }
}

fn errored(response: HandlerResponse) -> DispatchOutcome {
    DispatchOutcome {
        response: WireResponse::from_handler(response),
        final_state: DispatchState::Errored,
    }
}
