use crate::contract::{AppRoute, HttpMethod, ResponseSpec};
use crate::schema::{ParseOptions, SchemaError};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Maximum inline response headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response header storage; names are shared `Arc<str>`
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Body returned by a handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
    Empty,
}

impl ResponseBody {
    /// JSON view of the body; text becomes a JSON string, empty becomes null.
    /// Binary payloads have no JSON view.
    pub fn as_json(&self) -> Option<Value> {
        match self {
            ResponseBody::Json(v) => Some(v.clone()),
            ResponseBody::Text(s) => Some(Value::String(s.clone())),
            ResponseBody::Empty => Some(Value::Null),
            ResponseBody::Binary(_) => None,
        }
    }
}

impl From<Value> for ResponseBody {
    fn from(value: Value) -> Self {
        ResponseBody::Json(value)
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        ResponseBody::Text(value)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        ResponseBody::Binary(value)
    }
}

/// Status, headers and body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: ResponseBody,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<ResponseBody>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, ResponseBody::Empty)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Outbound response handed back to the framework adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResponse {
    pub status_code: u16,
    pub body: ResponseBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_override: Option<String>,
    #[serde(skip_serializing_if = "SmallVec::is_empty", serialize_with = "serialize_headers")]
    pub headers: HeaderVec,
}

fn serialize_headers<S: serde::Serializer>(headers: &HeaderVec, s: S) -> Result<S::Ok, S::Error> {
    s.collect_map(headers.iter().map(|(k, v)| (k.as_ref(), v.as_str())))
}

impl WireResponse {
    /// Response emitted as-is, without consulting the contract.
    pub fn from_handler(response: HandlerResponse) -> Self {
        Self {
            status_code: response.status,
            body: response.body,
            content_type_override: None,
            headers: response.headers,
        }
    }

    /// Body as JSON, when it has a JSON view.
    pub fn json_body(&self) -> Option<Value> {
        self.body.as_json()
    }
}

/// A handler returned a body that does not match the declared response schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseValidationError {
    /// `METHOD path` of the route
    pub route: String,
    pub status: u16,
    pub error: SchemaError,
}

impl fmt::Display for ResponseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: response body for status {} does not match its schema: {}",
            self.route, self.status, self.error
        )
    }
}

impl std::error::Error for ResponseValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Shape a handler response according to the route's declared responses.
///
/// - undeclared status: passed through unmodified
/// - other content type: content type set, body unvalidated
/// - no body: body dropped
/// - unchecked: passed through
/// - schema: parsed strictly when `validate` is set; the stripped value
///   replaces the body
pub fn shape_response(
    route: &AppRoute,
    response: HandlerResponse,
    validate: bool,
) -> Result<WireResponse, ResponseValidationError> {
    let status = response.status;
    let mut wire = WireResponse::from_handler(response);
    match route.response(status) {
        None | Some(ResponseSpec::Unchecked) => {}
        Some(ResponseSpec::OtherContentType { content_type, .. }) => {
            wire.content_type_override = Some(content_type.clone());
        }
        Some(ResponseSpec::NoBody) => {
            wire.body = ResponseBody::Empty;
        }
        Some(ResponseSpec::Schema(schema)) => {
            if validate {
                let raw = wire.body.as_json().ok_or_else(|| ResponseValidationError {
                    route: route.label(),
                    status,
                    error: SchemaError::message("expected a JSON body, got binary data"),
                })?;
                let parsed = schema
                    .parse(&raw, ParseOptions::strict())
                    .map_err(|error| ResponseValidationError {
                        route: route.label(),
                        status,
                        error,
                    })?;
                wire.body = ResponseBody::Json(parsed);
            }
        }
    }
    Ok(wire)
}

/// Check a received JSON body against the route's schema for `status`.
///
/// Statuses without a schema return the body unchanged. Used by the client.
pub fn parse_response_body(
    route: &AppRoute,
    status: u16,
    body: &Value,
) -> Result<Value, ResponseValidationError> {
    match route.response(status).and_then(ResponseSpec::schema) {
        Some(schema) => schema
            .parse(body, ParseOptions::strict())
            .map_err(|error| ResponseValidationError {
                route: route.label(),
                status,
                error,
            }),
        None => Ok(body.clone()),
    }
}

/// Typed escape hatch: a handler raises this to emit an explicit response.
///
/// The exception is scoped to one route. The dispatcher recognises it when it
/// is raised for the route being dispatched and emits exactly the carried
/// status and body; the status is not checked against the route's declared
/// responses.
///
/// ```rust
/// use contract_router::contract::AppRoute;
/// use contract_router::response::ContractException;
/// use serde_json::json;
///
/// let route = AppRoute::get("/posts/:id").response_unchecked(404).build().unwrap();
/// let err = anyhow::Error::new(ContractException::new(&route, 404, json!({ "message": "gone" })));
/// assert!(err.downcast_ref::<ContractException>().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContractException {
    pub method: HttpMethod,
    pub path: String,
    pub response: HandlerResponse,
}

impl ContractException {
    pub fn new(route: &AppRoute, status: u16, body: impl Into<ResponseBody>) -> Self {
        Self {
            method: route.method,
            path: route.path.clone(),
            response: HandlerResponse::new(status, body),
        }
    }

    /// Raised for `route` (same method and path template).
    pub fn is_for(&self, route: &AppRoute) -> bool {
        self.method == route.method && self.path == route.path
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn into_response(self) -> HandlerResponse {
        self.response
    }
}

impl fmt::Display for ContractException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "contract exception for {} {}: status {}",
            self.method, self.path, self.response.status
        )
    }
}

impl std::error::Error for ContractException {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;
    use serde_json::json;

    fn route() -> AppRoute {
        AppRoute::get("/posts/:id")
            .response(
                200,
                JsonSchema::new(json!({
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                }))
                .unwrap(),
            )
            .response_unchecked(404)
            .response_no_body(204)
            .response_other(201, "image/png")
            .build()
            .unwrap()
    }

    #[test]
    fn validation_strips_undeclared_keys() {
        let resp = HandlerResponse::json(200, json!({ "id": "1", "secret": "x" }));
        let wire = shape_response(&route(), resp, true).unwrap();
        assert_eq!(wire.body, ResponseBody::Json(json!({ "id": "1" })));
    }

    #[test]
    fn validation_disabled_passes_body_through() {
        let resp = HandlerResponse::json(200, json!({ "secret": "x" }));
        let wire = shape_response(&route(), resp, false).unwrap();
        assert_eq!(wire.body, ResponseBody::Json(json!({ "secret": "x" })));
    }

    #[test]
    fn invalid_body_is_an_error() {
        let resp = HandlerResponse::json(200, json!({ "id": 5 }));
        let err = shape_response(&route(), resp, true).unwrap_err();
        assert_eq!(err.status, 200);
        assert_eq!(err.route, "GET /posts/:id");
    }

    #[test]
    fn undeclared_and_unchecked_statuses_pass_through() {
        for status in [404, 418] {
            let resp = HandlerResponse::json(status, json!({ "anything": true }));
            let wire = shape_response(&route(), resp, true).unwrap();
            assert_eq!(wire.status_code, status);
            assert_eq!(wire.body, ResponseBody::Json(json!({ "anything": true })));
            assert_eq!(wire.content_type_override, None);
        }
    }

    #[test]
    fn other_content_type_sets_override() {
        let resp = HandlerResponse::new(201, vec![0x89, 0x50]);
        let wire = shape_response(&route(), resp, true).unwrap();
        assert_eq!(wire.content_type_override.as_deref(), Some("image/png"));
        assert_eq!(wire.body, ResponseBody::Binary(vec![0x89, 0x50]));
    }

    #[test]
    fn no_body_drops_the_body() {
        let resp = HandlerResponse::json(204, json!({ "ignored": true }));
        let wire = shape_response(&route(), resp, false).unwrap();
        assert_eq!(wire.body, ResponseBody::Empty);
    }

    #[test]
    fn wire_response_serializes_camel_case() {
        let wire = WireResponse::from_handler(
            HandlerResponse::json(200, json!({ "a": 1 })).with_header("x-trace", "t"),
        );
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({ "statusCode": 200, "body": { "a": 1 }, "headers": { "x-trace": "t" } })
        );
    }

    #[test]
    fn contract_exception_is_scoped_to_its_route() {
        let exc = ContractException::new(&route(), 404, json!(null));
        assert!(exc.is_for(&route()));
        let other = AppRoute::get("/other").build().unwrap();
        assert!(!exc.is_for(&other));
    }
}
