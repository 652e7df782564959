use super::core::{Schema, SchemaCompileError, SchemaError, SchemaIssue};
use jsonschema::Validator;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;

/// JSON Schema adapter compiled once with the `jsonschema` crate.
///
/// Successful parses strip object keys that are not listed under
/// `properties` (including `allOf` parts) unless `additionalProperties` is
/// `true` or a schema. Objects whose shape is only known through `$ref`,
/// `anyOf` or `oneOf` are left untouched.
///
/// Wire inputs (path params, headers, form-style query values) arrive as
/// strings. [`JsonSchema::coercing`] converts them to the primitive type the
/// schema declares before validating, and wraps a lone string in an array
/// where an array is expected.
pub struct JsonSchema {
    document: Value,
    validator: Validator,
    coerce: bool,
}

impl JsonSchema {
    /// Compile `document`; malformed schemas are rejected here, not per request.
    pub fn new(document: Value) -> Result<Self, SchemaCompileError> {
        let validator = jsonschema::validator_for(&document).map_err(|e| SchemaCompileError {
            message: e.to_string(),
        })?;
        Ok(Self {
            document,
            validator,
            coerce: false,
        })
    }

    /// Like [`JsonSchema::new`], with string to primitive coercion enabled.
    pub fn coercing(document: Value) -> Result<Self, SchemaCompileError> {
        let mut schema = Self::new(document)?;
        schema.coerce = true;
        Ok(schema)
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn is_coercing(&self) -> bool {
        self.coerce
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .field("coerce", &self.coerce)
            .finish()
    }
}

impl Schema for JsonSchema {
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError> {
        let candidate = if self.coerce {
            Cow::Owned(coerce(&self.document, value))
        } else {
            Cow::Borrowed(value)
        };

        let issues: Vec<SchemaIssue> = self
            .validator
            .iter_errors(candidate.as_ref())
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    SchemaIssue::new(e.to_string())
                } else {
                    SchemaIssue::at(path, e.to_string())
                }
            })
            .collect();
        if !issues.is_empty() {
            return Err(SchemaError::new(issues));
        }

        Ok(strip_undeclared(&self.document, candidate.into_owned()))
    }

    fn describe(&self) -> Option<Value> {
        Some(self.document.clone())
    }
}

/// Property schemas declared by `schema`, or `None` when the shape is not
/// statically known.
fn declared_properties(schema: &Map<String, Value>) -> Option<Map<String, Value>> {
    if ["$ref", "anyOf", "oneOf", "patternProperties"]
        .iter()
        .any(|k| schema.contains_key(*k))
    {
        return None;
    }

    let mut declared = Map::new();
    let mut seen = false;
    if let Some(Value::Object(props)) = schema.get("properties") {
        seen = true;
        declared.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(Value::Array(parts)) = schema.get("allOf") {
        for part in parts {
            let part = part.as_object()?;
            let nested = declared_properties(part)?;
            seen = true;
            declared.extend(nested);
        }
    }
    seen.then_some(declared)
}

fn additional_allowed(schema: &Map<String, Value>) -> bool {
    matches!(
        schema.get("additionalProperties"),
        Some(Value::Bool(true)) | Some(Value::Object(_))
    )
}

fn strip_undeclared(schema: &Value, value: Value) -> Value {
    let Some(schema) = schema.as_object() else {
        return value;
    };

    match value {
        Value::Object(map) => {
            let Some(props) = declared_properties(schema) else {
                return Value::Object(map);
            };
            let open = additional_allowed(schema);
            let kept = map
                .into_iter()
                .filter_map(|(key, value)| match props.get(&key) {
                    Some(sub) => {
                        let value = strip_undeclared(sub, value);
                        Some((key, value))
                    }
                    None if open => Some((key, value)),
                    None => None,
                })
                .collect();
            Value::Object(kept)
        }
        Value::Array(items) => match schema.get("items") {
            Some(item_schema @ Value::Object(_)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| strip_undeclared(item_schema, item))
                    .collect(),
            ),
            _ => Value::Array(items),
        },
        other => other,
    }
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn coerce_primitive(raw: &str, ty: &str) -> Option<Value> {
    match ty {
        "integer" => raw.parse::<i64>().ok().map(Value::from),
        "number" => raw
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)),
        "boolean" => raw.parse::<bool>().ok().map(Value::Bool),
        "null" if raw.is_empty() || raw == "null" => Some(Value::Null),
        _ => None,
    }
}

fn coerce(schema: &Value, value: &Value) -> Value {
    match value {
        Value::String(raw) => {
            let types = declared_types(schema);
            if types.contains(&"string") {
                return value.clone();
            }
            if types.contains(&"array") {
                if let Some(items) = schema.get("items") {
                    return Value::Array(vec![coerce(items, value)]);
                }
            }
            types
                .iter()
                .find_map(|ty| coerce_primitive(raw, ty))
                .unwrap_or_else(|| value.clone())
        }
        Value::Object(map) => {
            let props = schema.get("properties").and_then(Value::as_object);
            let coerced = map
                .iter()
                .map(|(k, v)| {
                    let v = match props.and_then(|p| p.get(k)) {
                        Some(sub) => coerce(sub, v),
                        None => v.clone(),
                    };
                    (k.clone(), v)
                })
                .collect();
            Value::Object(coerced)
        }
        Value::Array(items) => match schema.get("items") {
            Some(item_schema) => Value::Array(items.iter().map(|i| coerce(item_schema, i)).collect()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParseOptions;
    use serde_json::json;

    fn post_schema() -> JsonSchema {
        JsonSchema::new(json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "tags": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    }
                }
            },
            "required": ["id", "title"]
        }))
        .unwrap()
    }

    #[test]
    fn strips_undeclared_keys_recursively() {
        let out = post_schema()
            .parse(
                &json!({
                    "id": "1",
                    "title": "hello",
                    "secret": "x",
                    "tags": [{ "name": "rust", "internal": 7 }]
                }),
                ParseOptions::strict(),
            )
            .unwrap();
        assert_eq!(
            out,
            json!({ "id": "1", "title": "hello", "tags": [{ "name": "rust" }] })
        );
    }

    #[test]
    fn reports_validation_failures() {
        let err = post_schema()
            .parse(&json!({ "id": 1 }), ParseOptions::strict())
            .unwrap_err();
        assert!(!err.issues.is_empty());
    }

    #[test]
    fn issues_carry_the_instance_path() {
        let err = post_schema()
            .parse(
                &json!({ "id": 1, "title": "t", "tags": [{ "name": "ok" }, { "name": false }] }),
                ParseOptions::strict(),
            )
            .unwrap_err();
        let paths: Vec<Option<&str>> = err.issues.iter().map(|i| i.path.as_deref()).collect();
        assert!(paths.contains(&Some("/id")), "{paths:?}");
        assert!(paths.contains(&Some("/tags/1/name")), "{paths:?}");

        let err = post_schema()
            .parse(&json!("not an object"), ParseOptions::strict())
            .unwrap_err();
        assert_eq!(err.issues[0].path, None);
    }

    #[test]
    fn additional_properties_true_keeps_keys() {
        let schema = JsonSchema::new(json!({
            "type": "object",
            "properties": { "a": { "type": "integer" } },
            "additionalProperties": true
        }))
        .unwrap();
        let out = schema
            .parse(&json!({ "a": 1, "b": 2 }), ParseOptions::strict())
            .unwrap();
        assert_eq!(out, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn all_of_properties_are_declared() {
        let schema = JsonSchema::new(json!({
            "allOf": [
                { "type": "object", "properties": { "a": {} } },
                { "type": "object", "properties": { "b": {} } }
            ]
        }))
        .unwrap();
        let out = schema
            .parse(&json!({ "a": 1, "b": 2, "c": 3 }), ParseOptions::strict())
            .unwrap();
        assert_eq!(out, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn malformed_schema_fails_to_compile() {
        let err = JsonSchema::new(json!({ "type": 12 })).unwrap_err();
        assert!(err.to_string().starts_with("invalid schema"));
    }

    #[test]
    fn coercion_converts_wire_strings() {
        let schema = JsonSchema::coercing(json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer" },
                "ratio": { "type": "number" },
                "draft": { "type": "boolean" },
                "tag": { "type": "array", "items": { "type": "string" } },
                "name": { "type": "string" }
            }
        }))
        .unwrap();
        let out = schema
            .parse(
                &json!({ "limit": "10", "ratio": "0.5", "draft": "true", "tag": "a", "name": "42" }),
                ParseOptions::strict(),
            )
            .unwrap();
        assert_eq!(
            out,
            json!({ "limit": 10, "ratio": 0.5, "draft": true, "tag": ["a"], "name": "42" })
        );
    }

    #[test]
    fn non_coercing_schema_rejects_wire_strings() {
        let schema = JsonSchema::new(json!({
            "type": "object",
            "properties": { "limit": { "type": "integer" } }
        }))
        .unwrap();
        assert!(schema
            .parse(&json!({ "limit": "10" }), ParseOptions::strict())
            .is_err());
    }
}
