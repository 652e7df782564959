//! # Schema Module
//!
//! Uniform "parse-or-fail" contract over pluggable validation backends.
//!
//! ## Overview
//!
//! Every field category of a route (path params, query, headers, body and each
//! declared response) is described by a [`Schema`]. The rest of the crate only
//! ever calls [`Schema::parse`], so any validation library can back a contract
//! as long as an adapter implements [`Schema::parse_value`].
//!
//! Adapters shipped with the crate:
//!
//! - [`JsonSchema`] - JSON Schema documents compiled with the `jsonschema` crate
//! - [`SerdeSchema`] - any `serde` type; parsing is a deserialize/serialize round
//! - [`FnSchema`] - a closure, for ad-hoc checks in tests or glue code
//! - [`MergedSchema`] - several schemas that must all accept the value
//!
//! ## Extra keys
//!
//! Parsing strips keys a schema does not declare. Callers that need transport
//! metadata to survive (headers, path params) pass
//! [`ParseOptions::pass_through`]; un-declared top-level keys of the raw object
//! are then merged back into the parsed output.
//!
//! ## Absent schemas
//!
//! [`parse_optional`] treats a missing schema as a no-op success, returning
//! the raw value unchanged.
//!
//! ## Example
//!
//! ```rust
//! use contract_router::schema::{JsonSchema, ParseOptions, Schema};
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": { "id": { "type": "string" } },
//!     "required": ["id"]
//! }))
//! .unwrap();
//!
//! let parsed = schema
//!     .parse(&json!({ "id": "1", "extra": true }), ParseOptions::strict())
//!     .unwrap();
//! assert_eq!(parsed, json!({ "id": "1" }));
//! ```

mod core;
mod json;
mod serde_schema;

pub use core::{
    parse_optional, FnSchema, MergedSchema, ParseOptions, Schema, SchemaCompileError,
    SchemaError, SchemaIssue, SchemaRef,
};
pub use json::JsonSchema;
pub use serde_schema::SerdeSchema;
