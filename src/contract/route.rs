use super::error::ContractError;
use super::path;
use crate::schema::{Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// HTTP methods a route may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Mutation methods carry a request body declaration; GET never does.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }

    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method string that is not one of GET, POST, PUT, PATCH, DELETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl fmt::Display for UnsupportedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported HTTP method '{}'", self.0)
    }
}

impl std::error::Error for UnsupportedMethod {}

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

/// Request body declaration of a mutation route.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Body validated against a schema
    Schema(SchemaRef),
    /// Body accepted as-is (typed only by convention)
    Unchecked,
    /// Route explicitly takes no body
    NoBody,
}

impl RequestBody {
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            RequestBody::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

/// What a route declares for one response status.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// JSON body described by a schema
    Schema(SchemaRef),
    /// Non-JSON payload (binary, text, ...) sent with `content_type`
    OtherContentType {
        content_type: String,
        schema: Option<SchemaRef>,
    },
    /// Status carries no body; any returned body is dropped
    NoBody,
    /// Status is declared but its body is not checked (e.g. `404: null`)
    Unchecked,
}

impl ResponseSpec {
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            ResponseSpec::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            ResponseSpec::OtherContentType { content_type, .. } => Some(content_type),
            _ => None,
        }
    }
}

/// A single contract leaf: method, path and per-field schemas.
#[derive(Debug, Clone)]
pub struct AppRoute {
    pub method: HttpMethod,
    /// Path template, e.g. `/posts/:id`
    pub path: String,
    pub path_params: Option<SchemaRef>,
    pub query: Option<SchemaRef>,
    pub headers: Option<SchemaRef>,
    /// `Some` for mutation methods, `None` for GET
    pub body: Option<RequestBody>,
    pub responses: BTreeMap<u16, ResponseSpec>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Free-form metadata carried for adapters (auth hints, tags, ...)
    pub metadata: Option<Value>,
}

impl AppRoute {
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(method, path)
    }

    pub fn get(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(HttpMethod::Delete, path)
    }

    /// `METHOD path`, used in logs and error messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn response(&self, status: u16) -> Option<&ResponseSpec> {
        self.responses.get(&status)
    }

    pub fn declares_status(&self, status: u16) -> bool {
        self.responses.contains_key(&status)
    }

    pub fn body_schema(&self) -> Option<&SchemaRef> {
        self.body.as_ref().and_then(RequestBody::schema)
    }

    pub fn path_param_names(&self) -> Vec<String> {
        path::param_names(&self.path)
    }

    /// Two routes are the same endpoint when method and path template match.
    pub fn same_endpoint(&self, other: &AppRoute) -> bool {
        self.method == other.method && self.path == other.path
    }

    /// Check the route invariants: valid path template, valid status codes,
    /// and a body declaration exactly when the method is a mutation.
    pub fn validate(&self) -> Result<(), ContractError> {
        if let Some(reason) = path::template_problem(&self.path) {
            return Err(ContractError::InvalidPath {
                route: self.label(),
                reason,
            });
        }
        for status in self.responses.keys() {
            check_status(&self.label(), *status)?;
        }
        match (self.method.is_mutation(), &self.body) {
            (true, None) => Err(ContractError::MissingBody {
                route: self.label(),
            }),
            (false, Some(_)) => Err(ContractError::UnexpectedBody {
                route: self.label(),
            }),
            _ => Ok(()),
        }
    }
}

pub(crate) fn check_status(route: &str, status: u16) -> Result<(), ContractError> {
    // http accepts 100..=999; responses are limited to the registered classes
    match http::StatusCode::from_u16(status) {
        Ok(code) if (100..600).contains(&code.as_u16()) => Ok(()),
        _ => Err(ContractError::InvalidStatusCode {
            route: route.to_string(),
            status,
        }),
    }
}

/// Builder for [`AppRoute`]. Errors are collected and reported by [`RouteBuilder::build`].
///
/// ```rust
/// use contract_router::contract::AppRoute;
/// use contract_router::schema::JsonSchema;
/// use serde_json::json;
///
/// let route = AppRoute::get("/posts/:id")
///     .path_params(JsonSchema::new(json!({
///         "type": "object",
///         "properties": { "id": { "type": "string" } },
///         "required": ["id"]
///     })).unwrap())
///     .response(200, JsonSchema::new(json!({ "type": "object" })).unwrap())
///     .response_unchecked(404)
///     .summary("Get a post")
///     .build()
///     .unwrap();
/// assert!(route.declares_status(404));
/// ```
#[derive(Debug)]
pub struct RouteBuilder {
    route: AppRoute,
    error: Option<ContractError>,
}

impl RouteBuilder {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            route: AppRoute {
                method,
                path: path.into(),
                path_params: None,
                query: None,
                headers: None,
                body: None,
                responses: BTreeMap::new(),
                summary: None,
                description: None,
                deprecated: false,
                metadata: None,
            },
            error: None,
        }
    }

    pub fn path_params<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.route.path_params = Some(Arc::new(schema));
        self
    }

    pub fn query<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.route.query = Some(Arc::new(schema));
        self
    }

    pub fn headers<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.route.headers = Some(Arc::new(schema));
        self
    }

    pub fn body<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.route.body = Some(RequestBody::Schema(Arc::new(schema)));
        self
    }

    pub fn body_unchecked(mut self) -> Self {
        self.route.body = Some(RequestBody::Unchecked);
        self
    }

    pub fn no_body(mut self) -> Self {
        self.route.body = Some(RequestBody::NoBody);
        self
    }

    pub fn response<S: Schema + 'static>(self, status: u16, schema: S) -> Self {
        self.response_spec(status, ResponseSpec::Schema(Arc::new(schema)))
    }

    pub fn response_unchecked(self, status: u16) -> Self {
        self.response_spec(status, ResponseSpec::Unchecked)
    }

    pub fn response_no_body(self, status: u16) -> Self {
        self.response_spec(status, ResponseSpec::NoBody)
    }

    pub fn response_other(self, status: u16, content_type: impl Into<String>) -> Self {
        self.response_spec(
            status,
            ResponseSpec::OtherContentType {
                content_type: content_type.into(),
                schema: None,
            },
        )
    }

    /// Declare `spec` for `status`; a status may be declared only once.
    pub fn response_spec(mut self, status: u16, spec: ResponseSpec) -> Self {
        if self.route.responses.contains_key(&status) {
            if self.error.is_none() {
                self.error = Some(ContractError::DuplicateStatus {
                    route: self.route.label(),
                    status,
                });
            }
        } else {
            self.route.responses.insert(status, spec);
        }
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.route.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.route.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.route.deprecated = deprecated;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.route.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> Result<AppRoute, ContractError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.route.validate()?;
        Ok(self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FnSchema;

    fn any() -> FnSchema {
        FnSchema::new("any", |v| Ok(v.clone()))
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("OPTIONS".parse::<HttpMethod>().is_err());
        assert_eq!(
            HttpMethod::try_from(&http::Method::DELETE).unwrap(),
            HttpMethod::Delete
        );
    }

    #[test]
    fn mutation_routes_require_a_body() {
        let err = AppRoute::post("/posts").response(201, any()).build().unwrap_err();
        assert!(matches!(err, ContractError::MissingBody { .. }));
        assert!(AppRoute::delete("/posts/:id").no_body().build().is_ok());
    }

    #[test]
    fn get_routes_reject_a_body() {
        let err = AppRoute::get("/posts").body(any()).build().unwrap_err();
        assert!(matches!(err, ContractError::UnexpectedBody { .. }));
    }

    #[test]
    fn status_codes_are_checked() {
        let err = AppRoute::get("/x").response(42, any()).build().unwrap_err();
        assert_eq!(
            err,
            ContractError::InvalidStatusCode {
                route: "GET /x".into(),
                status: 42
            }
        );
        assert!(AppRoute::get("/x").response(799, any()).build().is_err());
    }

    #[test]
    fn one_spec_per_status() {
        let err = AppRoute::get("/x")
            .response(200, any())
            .response_unchecked(200)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateStatus { status: 200, .. }));
    }
}
