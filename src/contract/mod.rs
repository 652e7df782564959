//! # Contract Module
//!
//! The declarative description of an API: routes with their method, path
//! template and per-field schemas, grouped into arbitrarily nested routers.
//!
//! ## Overview
//!
//! - [`AppRoute`] - one leaf: method, path, path params, query, headers, body
//!   and the response declared for each status code
//! - [`ContractRouter`] - a named grouping of routes and sub-routers, kept in
//!   declaration order
//! - [`RouterOptions`] - path prefix, common responses and base headers applied
//!   to every nested route
//! - [`load_contract`] / [`parse_contract`] - build a contract from a YAML or
//!   JSON document
//!
//! Contracts are validated when built. Invalid status codes, duplicate
//! statuses, missing mutation bodies and malformed path templates or schemas
//! all surface as [`ContractError`] before any request is served.
//!
//! ## Document format
//!
//! ```yaml
//! x-path-prefix: /api
//! x-common-responses:
//!   500: null
//! posts:
//!   get:
//!     method: GET
//!     path: /posts/:id
//!     pathParams:
//!       type: object
//!       properties: { id: { type: string } }
//!     responses:
//!       200: { type: object, properties: { id: { type: string } } }
//!       404: null
//!   create:
//!     method: POST
//!     path: /posts
//!     body: { type: object }
//!     responses:
//!       201: null
//!       204: { noBody: true }
//! ```
//!
//! Response entries map as follows: `null` is an unchecked status,
//! `{noBody: true}` drops the body, `{contentType, schema?}` sends a non-JSON
//! payload, and anything else is a JSON Schema. A `null` body declares an
//! unchecked body.

mod error;
mod load;
pub mod path;
mod route;
mod router;

pub use error::ContractError;
pub use load::{load_contract, parse_contract};
pub use route::{
    AppRoute, HttpMethod, RequestBody, ResponseSpec, RouteBuilder, UnsupportedMethod,
};
pub use router::{ContractNode, ContractRouter, RouterOptions};
