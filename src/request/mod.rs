//! # Request Module
//!
//! Validates an inbound request against a route's schemas.
//!
//! ## Overview
//!
//! The framework adapter hands over a [`RawRequest`]: path params, headers,
//! query (raw string or pre-decoded map) and parsed body. [`validate_request`]
//! runs the four slots independently and either returns a [`ValidatedRequest`]
//! or a [`RequestValidationError`] carrying every failing slot.
//!
//! | Slot | Extra keys | Notes |
//! |------|------------|-------|
//! | path params | kept | routers may inject metadata next to declared params |
//! | headers | kept | arbitrary transport headers coexist with declared ones |
//! | query | stripped | optionally JSON-decoded per key first (`json_query`) |
//! | body | stripped | only checked when the route declares a body schema |
//!
//! ## Query strings
//!
//! [`parse_query_string`] decodes bracket notation (`a[b]=c`, `a[]=x`,
//! repeated keys). With `json_query` enabled every string value is decoded as
//! JSON first, falling back to the raw string. The matching encoders
//! ([`encode_query`], [`encode_json_query`]) are used by the client.

mod core;
mod query;

pub use core::{
    validate_request, ParamValue, RawQuery, RawRequest, RequestValidationError,
    ValidatedRequest, ValidationOptions,
};
pub use query::{
    decode_json_query, encode_json_query, encode_query, parse_query_string, MAX_QUERY_DEPTH,
};
