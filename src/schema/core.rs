use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a schema; contracts are built once and read concurrently.
pub type SchemaRef = Arc<dyn Schema>;

/// Options applied by [`Schema::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep keys present in the raw object but not declared by the schema.
    pub pass_through_extra_keys: bool,
}

impl ParseOptions {
    /// Un-declared keys are stripped from the output.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            pass_through_extra_keys: false,
        }
    }

    /// Un-declared top-level keys are retained unchanged.
    #[must_use]
    pub const fn pass_through() -> Self {
        Self {
            pass_through_extra_keys: true,
        }
    }
}

/// A single problem reported by a schema backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// JSON pointer to the offending value, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human readable description
    pub message: String,
}

impl SchemaIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

/// Expected validation failure. Serializes as `{ "issues": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaError {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    /// Error with a single, location-less issue.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            issues: vec![SchemaIssue::new(message)],
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match &issue.path {
                Some(path) if !path.is_empty() => write!(f, "{}: {}", path, issue.message)?,
                _ => f.write_str(&issue.message)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// A schema document could not be compiled. This is a programming error in the
/// contract, surfaced when the contract is built rather than per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCompileError {
    pub message: String,
}

impl fmt::Display for SchemaCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl std::error::Error for SchemaCompileError {}

/// Capability interface every validation backend satisfies.
///
/// Implementors provide [`Schema::parse_value`], which validates the raw value
/// and returns the parsed value with un-declared keys stripped. The provided
/// [`Schema::parse`] layers [`ParseOptions`] on top so pass-through behaves the
/// same for every backend.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Validate `value`, returning the parsed (stripped) value.
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError>;

    /// Machine readable description of the schema, if the backend has one.
    fn describe(&self) -> Option<Value> {
        None
    }

    fn parse(&self, value: &Value, options: ParseOptions) -> Result<Value, SchemaError> {
        let parsed = self.parse_value(value)?;
        if options.pass_through_extra_keys {
            Ok(merge_extra_keys(value, parsed))
        } else {
            Ok(parsed)
        }
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError> {
        (**self).parse_value(value)
    }

    fn describe(&self) -> Option<Value> {
        (**self).describe()
    }

    fn parse(&self, value: &Value, options: ParseOptions) -> Result<Value, SchemaError> {
        (**self).parse(value, options)
    }
}

/// Parse with an optional schema; an absent schema returns `value` unchanged.
pub fn parse_optional(
    schema: Option<&SchemaRef>,
    value: &Value,
    options: ParseOptions,
) -> Result<Value, SchemaError> {
    match schema {
        Some(schema) => schema.parse(value, options),
        None => Ok(value.clone()),
    }
}

/// Raw keys missing from `parsed` are copied back; parsed values win.
fn merge_extra_keys(raw: &Value, parsed: Value) -> Value {
    match (raw, parsed) {
        (Value::Object(raw), Value::Object(mut parsed)) => {
            for (key, value) in raw {
                if !parsed.contains_key(key) {
                    parsed.insert(key.clone(), value.clone());
                }
            }
            Value::Object(parsed)
        }
        (_, parsed) => parsed,
    }
}

type ParseFn = dyn Fn(&Value) -> Result<Value, SchemaError> + Send + Sync;

/// Schema backed by a closure.
///
/// ```rust
/// use contract_router::schema::{FnSchema, ParseOptions, Schema, SchemaError};
/// use serde_json::{json, Value};
///
/// let even = FnSchema::new("even", |v: &Value| match v.as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v.clone()),
///     _ => Err(SchemaError::message("expected an even integer")),
/// });
/// assert!(even.parse(&json!(4), ParseOptions::strict()).is_ok());
/// assert!(even.parse(&json!(3), ParseOptions::strict()).is_err());
/// ```
#[derive(Clone)]
pub struct FnSchema {
    name: String,
    parse: Arc<ParseFn>,
}

impl FnSchema {
    pub fn new<F>(name: impl Into<String>, parse: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parse: Arc::new(parse),
        }
    }
}

impl fmt::Debug for FnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").field("name", &self.name).finish()
    }
}

impl Schema for FnSchema {
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError> {
        (self.parse)(value)
    }
}

/// Every part must accept the value; object outputs are merged left to right.
///
/// Outputs are unioned, so a key declared by any part survives. Used for
/// router-level base headers.
#[derive(Debug, Clone)]
pub struct MergedSchema {
    parts: Vec<SchemaRef>,
}

impl MergedSchema {
    pub fn new(parts: Vec<SchemaRef>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[SchemaRef] {
        &self.parts
    }
}

impl Schema for MergedSchema {
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError> {
        let mut issues = Vec::new();
        let mut outputs = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            match part.parse_value(value) {
                Ok(parsed) => outputs.push(parsed),
                Err(err) => issues.extend(err.issues),
            }
        }
        if !issues.is_empty() {
            return Err(SchemaError::new(issues));
        }

        let mut merged: Option<Value> = None;
        for output in outputs {
            merged = Some(match (merged, output) {
                (Some(Value::Object(mut acc)), Value::Object(next)) => {
                    acc.extend(next);
                    Value::Object(acc)
                }
                (_, next) => next,
            });
        }
        Ok(merged.unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn describe(&self) -> Option<Value> {
        let all: Vec<Value> = self.parts.iter().filter_map(|p| p.describe()).collect();
        if all.is_empty() {
            None
        } else {
            Some(serde_json::json!({ "allOf": all }))
        }
    }
}
