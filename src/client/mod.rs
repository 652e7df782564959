//! # Client Module
//!
//! Typed-by-contract HTTP client.
//!
//! A [`Client`] holds the same [`ContractRouter`](crate::contract::ContractRouter)
//! the server is built from. Each call names a route by its dotted key,
//! fills path parameters into the template, encodes the query (bracket
//! notation, or JSON per value when `json_query` is on) and sends through a
//! [`Transport`]. [`ReqwestTransport`] is the default transport; tests and
//! in-process setups can provide their own.

mod core;
mod transport;

pub use core::{build_request, Client, ClientArgs, ClientError, ClientOptions, ClientRequest, ClientResponse};
pub use transport::{ReqwestTransport, Transport};
