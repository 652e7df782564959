//! # Response Module
//!
//! Shapes handler output according to the route's declared responses.
//!
//! [`shape_response`] turns a [`HandlerResponse`] into the [`WireResponse`]
//! handed back to the framework adapter. Declared JSON schemas are enforced
//! only when response validation is enabled; a failing body yields a
//! [`ResponseValidationError`], which the dispatcher maps to a generic 500.
//!
//! Handlers can short-circuit with a [`ContractException`], an error carrying
//! an explicit status and body for one route.

mod core;

pub use core::{
    parse_response_body, shape_response, ContractException, HandlerResponse, HeaderVec,
    ResponseBody, ResponseValidationError, WireResponse, MAX_INLINE_HEADERS,
};
