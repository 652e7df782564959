//! # contract-router
//!
//! Contract-first routing core: a single declarative route contract drives
//! request validation, handler dispatch, response shaping and client calls,
//! independently of the HTTP framework carrying the traffic.
//!
//! ## Architecture
//!
//! - **[`schema`]** - the schema adapter seam (`Schema` trait, JSON Schema,
//!   serde-typed, closure and composite adapters)
//! - **[`contract`]** - routes, nested routers, router options, path templates
//!   and the YAML/JSON contract loader
//! - **[`resolver`]** - pairs an implementation tree with its contract
//! - **[`request`]** - per-slot request validation and query decoding
//! - **[`response`]** - response validation, unknown-key stripping and the
//!   contract exception
//! - **[`dispatcher`]** - validate → invoke → shape, per request
//! - **[`router`]** - path-template route table for in-process adapters
//! - **[`typed`]** - strongly typed handlers over validated input
//! - **[`client`]** - contract-driven HTTP client
//! - **[`config`]**, **[`logging`]** - options and tracing setup
//!
//! ### Request Handling Flow
//!
//! ```text
//! RawRequest ──► RouteTable::route ──► validate_request ──► handler
//!                                            │                 │
//!                                     400 (combined)   HandlerResponse
//!                                                              │
//!                                         shape_response ◄─────┘
//!                                               │
//!                                          WireResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use contract_router::config::ServerOptions;
//! use contract_router::contract::{AppRoute, ContractRouter, HttpMethod};
//! use contract_router::dispatcher::{Dispatcher, RouteHandler};
//! use contract_router::request::RawRequest;
//! use contract_router::resolver::ImplRouter;
//! use contract_router::response::HandlerResponse;
//! use contract_router::schema::JsonSchema;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let contract = ContractRouter::new().router(
//!     "posts",
//!     ContractRouter::new().route(
//!         "get",
//!         AppRoute::get("/posts/:id")
//!             .response(200, JsonSchema::new(json!({
//!                 "type": "object",
//!                 "properties": { "id": { "type": "string" } }
//!             }))?)
//!             .build()?,
//!     ),
//! );
//! let implementation = ImplRouter::new().router(
//!     "posts",
//!     ImplRouter::new().handler(
//!         "get",
//!         RouteHandler::sync(|req| {
//!             let id = req.param_str("id").unwrap_or_default().to_string();
//!             Ok(HandlerResponse::json(200, json!({ "id": id, "secret": true })))
//!         }),
//!     ),
//! );
//!
//! let mut options = ServerOptions::default();
//! options.validate_responses = true;
//! let dispatcher = Dispatcher::from_router(&contract, &implementation, options)?;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let outcome = runtime.block_on(dispatcher.handle(RawRequest::new(HttpMethod::Get, "/posts/7")))?;
//! assert_eq!(outcome.response.json_body(), Some(json!({ "id": "7" })));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Server options come from code, a YAML/JSON/TOML file
//! ([`config::ServerOptions::from_file`]) or `CONTRACT_*` environment
//! variables ([`config::ServerOptions::from_env`]). Logging is configured with
//! `CONTRACT_LOG_LEVEL`, `CONTRACT_LOG_FORMAT`, `CONTRACT_LOG_FILTER` and
//! `CONTRACT_LOG_LOCATION`.

pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod echo;
pub mod logging;
pub mod request;
pub mod resolver;
pub mod response;
pub mod router;
pub mod schema;
pub mod typed;

pub use contract::{load_contract, AppRoute, ContractRouter, HttpMethod};
pub use dispatcher::{Dispatcher, RouteHandler};
pub use resolver::{resolve, ImplRouter};
pub use schema::{JsonSchema, Schema};
