use super::error::ContractError;
use super::route::{AppRoute, HttpMethod, RequestBody, ResponseSpec, RouteBuilder};
use super::router::{ContractNode, ContractRouter, RouterOptions};
use crate::schema::{JsonSchema, SchemaRef};
use anyhow::Context;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Load a contract document from a YAML or JSON file.
///
/// Files ending in `.yaml` or `.yml` are read as YAML, everything else as JSON.
pub fn load_contract(path: impl AsRef<Path>) -> anyhow::Result<ContractRouter> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read contract {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let document: Value = if is_yaml {
        // Go through serde_yaml::Value so integer status keys become strings
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))?;
        serde_json::to_value(yaml)
            .with_context(|| format!("unsupported YAML construct in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))?
    };
    let contract = parse_contract(&document)
        .with_context(|| format!("invalid contract {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        routes = contract.route_count(),
        "Loaded contract"
    );
    Ok(contract)
}

/// Build a contract from an in-memory document.
///
/// A node is a route when it has string `method` and `path` fields; any other
/// object is a router. Router keys starting with `x-` carry router options.
/// Sibling keys are visited in lexicographic order; build the contract in code
/// when declaration order must decide route precedence.
pub fn parse_contract(document: &Value) -> Result<ContractRouter, ContractError> {
    let object = document
        .as_object()
        .ok_or_else(|| invalid("$", "contract root must be an object"))?;
    parse_router("$", object)
}

fn is_route(object: &Map<String, Value>) -> bool {
    matches!(object.get("method"), Some(Value::String(_)))
        && matches!(object.get("path"), Some(Value::String(_)))
}

fn parse_router(location: &str, object: &Map<String, Value>) -> Result<ContractRouter, ContractError> {
    let mut router = ContractRouter::new();
    let mut options = RouterOptions::default();
    for (key, value) in object {
        let here = format!("{location}.{key}");
        match key.as_str() {
            "x-path-prefix" => {
                let prefix = value
                    .as_str()
                    .ok_or_else(|| invalid(&here, "expected a string"))?;
                options.path_prefix = Some(prefix.to_string());
            }
            "x-common-responses" => {
                options.common_responses = parse_responses(&here, value)?;
            }
            "x-base-headers" => {
                options.base_headers = Some(compile(&here, value, true)?);
            }
            k if k.starts_with("x-") => {
                tracing::debug!(location = %here, "Ignoring unknown router extension");
            }
            _ => {
                let child = value
                    .as_object()
                    .ok_or_else(|| invalid(&here, "expected a route or router object"))?;
                let node = if is_route(child) {
                    ContractNode::Route(Arc::new(parse_route(&here, child)?))
                } else {
                    ContractNode::Router(parse_router(&here, child)?)
                };
                router.insert(key.clone(), node);
            }
        }
    }
    router.with_options(&options)
}

fn parse_route(location: &str, object: &Map<String, Value>) -> Result<AppRoute, ContractError> {
    let method_str = object.get("method").and_then(Value::as_str).unwrap_or_default();
    let method: HttpMethod = method_str
        .parse()
        .map_err(|e: super::route::UnsupportedMethod| invalid(location, e.to_string()))?;
    let path = object.get("path").and_then(Value::as_str).unwrap_or_default();
    let mut builder = RouteBuilder::new(method, path);

    for (key, value) in object {
        let here = format!("{location}.{key}");
        builder = match key.as_str() {
            "method" | "path" => builder,
            "pathParams" => builder.path_params(compile(&here, value, true)?),
            "query" => builder.query(compile(&here, value, true)?),
            "headers" => builder.headers(compile(&here, value, true)?),
            "body" => match parse_body(&here, value)? {
                RequestBody::Schema(schema) => builder.body(schema),
                RequestBody::Unchecked => builder.body_unchecked(),
                RequestBody::NoBody => builder.no_body(),
            },
            "responses" => parse_responses(&here, value)?
                .into_iter()
                .fold(builder, |b, (status, spec)| b.response_spec(status, spec)),
            "summary" => builder.summary(expect_str(&here, value)?),
            "description" => builder.description(expect_str(&here, value)?),
            "deprecated" => builder.deprecated(
                value
                    .as_bool()
                    .ok_or_else(|| invalid(&here, "expected a boolean"))?,
            ),
            "metadata" => builder.metadata(value.clone()),
            _ => return Err(invalid(&here, "unknown route field")),
        };
    }
    builder.build()
}

fn parse_body(location: &str, value: &Value) -> Result<RequestBody, ContractError> {
    if value.is_null() {
        return Ok(RequestBody::Unchecked);
    }
    if is_no_body(value) {
        return Ok(RequestBody::NoBody);
    }
    Ok(RequestBody::Schema(compile(location, value, false)?))
}

fn parse_responses(location: &str, value: &Value) -> Result<BTreeMap<u16, ResponseSpec>, ContractError> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid(location, "expected a map of status code to response"))?;
    let mut responses = BTreeMap::new();
    for (key, entry) in object {
        let here = format!("{location}.{key}");
        let status: u16 = key
            .parse()
            .map_err(|_| invalid(&here, "response key must be a numeric status code"))?;
        responses.insert(status, parse_response(&here, entry)?);
    }
    Ok(responses)
}

fn parse_response(location: &str, value: &Value) -> Result<ResponseSpec, ContractError> {
    if value.is_null() {
        return Ok(ResponseSpec::Unchecked);
    }
    if is_no_body(value) {
        return Ok(ResponseSpec::NoBody);
    }
    if let Some(content_type) = value.get("contentType") {
        let content_type = expect_str(&format!("{location}.contentType"), content_type)?;
        let schema = match value.get("schema") {
            Some(schema) if !schema.is_null() => {
                Some(compile(&format!("{location}.schema"), schema, false)?)
            }
            _ => None,
        };
        return Ok(ResponseSpec::OtherContentType {
            content_type,
            schema,
        });
    }
    Ok(ResponseSpec::Schema(compile(location, value, false)?))
}

fn is_no_body(value: &Value) -> bool {
    value.get("noBody").and_then(Value::as_bool) == Some(true)
}

/// Wire-string inputs (path params, query, headers) get coercing schemas.
fn compile(location: &str, document: &Value, coerce: bool) -> Result<SchemaRef, ContractError> {
    let compiled = if coerce {
        JsonSchema::coercing(document.clone())
    } else {
        JsonSchema::new(document.clone())
    };
    compiled
        .map(|schema| Arc::new(schema) as SchemaRef)
        .map_err(|source| ContractError::InvalidSchema {
            location: location.to_string(),
            source,
        })
}

fn expect_str(location: &str, value: &Value) -> Result<String, ContractError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(location, "expected a string"))
}

fn invalid(location: &str, reason: impl Into<String>) -> ContractError {
    ContractError::InvalidDocument {
        location: location.to_string(),
        reason: reason.into(),
    }
}
