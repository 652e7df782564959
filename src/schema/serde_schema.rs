use super::core::{Schema, SchemaError, SchemaIssue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Schema backed by a Rust type.
///
/// Parsing deserializes the raw value into `T` and serializes it back, so the
/// output carries exactly the fields `T` declares. Use
/// `#[serde(deny_unknown_fields)]` on `T` to reject extra keys instead.
///
/// ```rust
/// use contract_router::schema::{ParseOptions, Schema, SerdeSchema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Post { id: String, title: String }
///
/// let schema = SerdeSchema::<Post>::new();
/// let out = schema
///     .parse(&json!({"id": "1", "title": "t", "draft": true}), ParseOptions::strict())
///     .unwrap();
/// assert_eq!(out, json!({"id": "1", "title": "t"}));
/// ```
pub struct SerdeSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeSchema<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeSchema<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn parse_value(&self, value: &Value) -> Result<Value, SchemaError> {
        let typed: T = serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::new(vec![SchemaIssue::new(e.to_string())]))?;
        serde_json::to_value(typed)
            .map_err(|e| SchemaError::new(vec![SchemaIssue::new(e.to_string())]))
    }
}
