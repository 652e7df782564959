//! # Dispatcher Module
//!
//! Runs one inbound request through the contract pipeline.
//!
//! ## Request Flow
//!
//! ```text
//! validate request -> invoke handler -> validate response -> Sent
//!        |                                     |
//!        +------------------> Errored <--------+
//! ```
//!
//! 1. All four request slots are validated before the handler runs. A
//!    failure is turned into a response by the configured request error
//!    handler (combined 400 payload by default).
//! 2. The handler is invoked at most once. Errors it returns propagate as
//!    [`DispatchError::Handler`], except a
//!    [`ContractException`](crate::response::ContractException) raised for the
//!    dispatching route, which is treated as a normal response.
//! 3. The response is shaped against the route's declared responses. When
//!    response validation is on, a body that fails its schema becomes a
//!    generic 500 (or whatever the response error handler returns).
//!
//! ## Example
//!
//! ```rust
//! use contract_router::config::ServerOptions;
//! use contract_router::contract::{AppRoute, ContractRouter, HttpMethod};
//! use contract_router::dispatcher::{Dispatcher, RouteHandler};
//! use contract_router::request::RawRequest;
//! use contract_router::resolver::ImplRouter;
//! use contract_router::response::HandlerResponse;
//! use serde_json::json;
//!
//! let contract = ContractRouter::new()
//!     .route("health", AppRoute::get("/health").response_unchecked(200).build().unwrap());
//! let implementation = ImplRouter::new().handler(
//!     "health",
//!     RouteHandler::sync(|_| Ok(HandlerResponse::json(200, json!({ "ok": true })))),
//! );
//! let dispatcher =
//!     Dispatcher::from_router(&contract, &implementation, ServerOptions::default()).unwrap();
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let outcome = rt
//!     .block_on(dispatcher.handle(RawRequest::new(HttpMethod::Get, "/health")))
//!     .unwrap();
//! assert_eq!(outcome.response.status_code, 200);
//! ```

mod core;

pub use core::{
    DispatchError, DispatchOutcome, DispatchState, Dispatcher, HandlerFuture, HandlerRequest,
    RouteHandler,
};
