use super::query::{decode_json_query, parse_query_string};
use crate::contract::{AppRoute, HttpMethod};
use crate::schema::{parse_optional, ParseOptions, SchemaError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A header or query value as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// First value, for callers that only care about one.
    pub fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Single(v) => Some(v),
            ParamValue::Multi(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ParamValue::Single(v) => Value::String(v.clone()),
            ParamValue::Multi(vs) => Value::Array(vs.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

/// Query as handed over by the transport: either the raw string or a map the
/// framework already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RawQuery {
    String(String),
    Structured(Map<String, Value>),
}

impl Default for RawQuery {
    fn default() -> Self {
        RawQuery::Structured(Map::new())
    }
}

impl RawQuery {
    /// Structured form; raw strings are decoded with bracket notation.
    pub fn decode(&self) -> Map<String, Value> {
        match self {
            RawQuery::String(raw) => parse_query_string(raw),
            RawQuery::Structured(map) => map.clone(),
        }
    }
}

/// Inbound request in the shape the framework adapter provides.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: HttpMethod,
    pub path: String,
    pub path_params: HashMap<String, String>,
    /// Header names are used as given; case folding is the adapter's job
    pub headers: HashMap<String, ParamValue>,
    pub query: RawQuery,
    /// Parsed JSON body, or `Value::Null` when the request had none
    pub body: Value,
}

impl RawRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: HashMap::new(),
            headers: HashMap::new(),
            query: RawQuery::default(),
            body: Value::Null,
        }
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query_string(mut self, raw: impl Into<String>) -> Self {
        self.query = RawQuery::String(raw.into());
        self
    }

    pub fn query(mut self, query: Map<String, Value>) -> Self {
        self.query = RawQuery::Structured(query);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    fn path_params_value(&self) -> Value {
        Value::Object(
            self.path_params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    fn headers_value(&self) -> Value {
        Value::Object(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

/// Which request slots are checked, and how the query is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Decode each query value as JSON before parsing
    pub json_query: bool,
    pub path_params: bool,
    pub headers: bool,
    pub query: bool,
    pub body: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            json_query: false,
            path_params: true,
            headers: true,
            query: true,
            body: true,
        }
    }
}

/// Parsed request values, ready for a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub params: Value,
    pub headers: Value,
    pub query: Value,
    pub body: Value,
}

/// One or more request slots failed their schema.
///
/// Each slot is `None` when that category passed (or was skipped). Serializes
/// to the combined 400 payload shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestValidationError {
    pub path_parameter_errors: Option<SchemaError>,
    pub header_errors: Option<SchemaError>,
    pub query_parameter_errors: Option<SchemaError>,
    pub body_errors: Option<SchemaError>,
}

impl RequestValidationError {
    pub fn is_empty(&self) -> bool {
        self.path_parameter_errors.is_none()
            && self.header_errors.is_none()
            && self.query_parameter_errors.is_none()
            && self.body_errors.is_none()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request validation failed")?;
        let slots = [
            ("path parameters", &self.path_parameter_errors),
            ("headers", &self.header_errors),
            ("query", &self.query_parameter_errors),
            ("body", &self.body_errors),
        ];
        for (name, slot) in slots {
            if let Some(err) = slot {
                write!(f, "; {name}: {err}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RequestValidationError {}

/// Validate all four request slots against `route`.
///
/// Every enabled slot is parsed even when an earlier one fails, so the error
/// reports each failing category. A disabled slot passes its raw value through.
pub fn validate_request(
    route: &AppRoute,
    raw: &RawRequest,
    options: &ValidationOptions,
) -> Result<ValidatedRequest, RequestValidationError> {
    let mut errors = RequestValidationError::default();

    let params = check(
        options.path_params,
        route.path_params.as_ref(),
        raw.path_params_value(),
        ParseOptions::pass_through(),
        &mut errors.path_parameter_errors,
    );
    let headers = check(
        options.headers,
        route.headers.as_ref(),
        raw.headers_value(),
        ParseOptions::pass_through(),
        &mut errors.header_errors,
    );

    let mut query = raw.query.decode();
    if options.json_query {
        query = decode_json_query(query);
    }
    let query = check(
        options.query,
        route.query.as_ref(),
        Value::Object(query),
        ParseOptions::strict(),
        &mut errors.query_parameter_errors,
    );
    let body = check(
        options.body,
        route.body_schema(),
        raw.body.clone(),
        ParseOptions::strict(),
        &mut errors.body_errors,
    );

    if errors.is_empty() {
        Ok(ValidatedRequest {
            params,
            headers,
            query,
            body,
        })
    } else {
        Err(errors)
    }
}

fn check(
    enabled: bool,
    schema: Option<&crate::schema::SchemaRef>,
    value: Value,
    parse: ParseOptions,
    slot: &mut Option<SchemaError>,
) -> Value {
    if !enabled {
        return value;
    }
    match parse_optional(schema, &value, parse) {
        Ok(parsed) => parsed,
        Err(err) => {
            *slot = Some(err);
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;
    use serde_json::json;

    fn object(properties: Value, required: &[&str]) -> JsonSchema {
        JsonSchema::coercing(json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }))
        .unwrap()
    }

    fn route() -> AppRoute {
        AppRoute::post("/posts/:id")
            .path_params(object(json!({ "id": { "type": "string" } }), &["id"]))
            .headers(object(json!({ "x-api-key": { "type": "string" } }), &["x-api-key"]))
            .query(object(json!({ "draft": { "type": "boolean" } }), &[]))
            .body(
                JsonSchema::new(json!({
                    "type": "object",
                    "properties": { "title": { "type": "string" } },
                    "required": ["title"]
                }))
                .unwrap(),
            )
            .response_unchecked(200)
            .build()
            .unwrap()
    }

    #[test]
    fn valid_request_parses_every_slot() {
        let raw = RawRequest::new(HttpMethod::Post, "/posts/1")
            .path_param("id", "1")
            .header("x-api-key", "k")
            .header("host", "localhost")
            .query_string("draft=true&page=2")
            .body(json!({ "title": "t", "extra": 1 }));
        let out = validate_request(&route(), &raw, &ValidationOptions::default()).unwrap();
        assert_eq!(out.params, json!({ "id": "1" }));
        assert_eq!(out.headers, json!({ "x-api-key": "k", "host": "localhost" }));
        assert_eq!(out.query, json!({ "draft": true }));
        assert_eq!(out.body, json!({ "title": "t" }));
    }

    #[test]
    fn every_failing_slot_is_reported() {
        let raw = RawRequest::new(HttpMethod::Post, "/posts")
            .query_string("draft=maybe")
            .body(json!({}));
        let err = validate_request(&route(), &raw, &ValidationOptions::default()).unwrap_err();
        assert!(err.path_parameter_errors.is_some());
        assert!(err.header_errors.is_some());
        assert!(err.query_parameter_errors.is_some());
        assert!(err.body_errors.is_some());

        let payload = err.to_json();
        for key in ["pathParameterErrors", "headerErrors", "queryParameterErrors", "bodyErrors"] {
            assert!(payload.get(key).is_some_and(|v| !v.is_null()), "{key}");
        }
    }

    #[test]
    fn passing_slots_serialize_as_null() {
        let raw = RawRequest::new(HttpMethod::Post, "/posts/1")
            .path_param("id", "1")
            .header("x-api-key", "k")
            .body(json!({ "nope": true }));
        let err = validate_request(&route(), &raw, &ValidationOptions::default()).unwrap_err();
        let payload = err.to_json();
        assert_eq!(payload["pathParameterErrors"], Value::Null);
        assert_eq!(payload["headerErrors"], Value::Null);
        assert_eq!(payload["queryParameterErrors"], Value::Null);
        assert!(payload["bodyErrors"]["issues"].is_array());
    }

    #[test]
    fn disabled_slots_pass_raw_values() {
        let raw = RawRequest::new(HttpMethod::Post, "/posts/1")
            .path_param("id", "1")
            .header("x-api-key", "k")
            .body(json!({ "nope": true }));
        let options = ValidationOptions {
            body: false,
            ..Default::default()
        };
        let out = validate_request(&route(), &raw, &options).unwrap();
        assert_eq!(out.body, json!({ "nope": true }));
    }

    #[test]
    fn json_query_decodes_before_parsing() {
        let route = AppRoute::get("/search")
            .query(
                JsonSchema::new(json!({
                    "type": "object",
                    "properties": {
                        "filter": {
                            "type": "object",
                            "properties": { "a": { "type": "integer" } }
                        }
                    }
                }))
                .unwrap(),
            )
            .response_unchecked(200)
            .build()
            .unwrap();
        let raw = RawRequest::new(HttpMethod::Get, "/search")
            .query_string("filter=%7B%22a%22%3A1%7D");
        let options = ValidationOptions {
            json_query: true,
            ..Default::default()
        };
        let out = validate_request(&route, &raw, &options).unwrap();
        assert_eq!(out.query, json!({ "filter": { "a": 1 } }));

        let err = validate_request(&route, &raw, &ValidationOptions::default()).unwrap_err();
        assert!(err.query_parameter_errors.is_some());
    }

    #[test]
    fn absent_body_schema_passes_body_unchanged() {
        let route = AppRoute::put("/raw").body_unchecked().build().unwrap();
        let raw = RawRequest::new(HttpMethod::Put, "/raw").body(json!({ "anything": [1] }));
        let out = validate_request(&route, &raw, &ValidationOptions::default()).unwrap();
        assert_eq!(out.body, json!({ "anything": [1] }));
    }
}
