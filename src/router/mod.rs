//! # Router Module
//!
//! Matches a method and concrete path to a resolved route.
//!
//! ## Overview
//!
//! Routing is normally the host framework's job. [`RouteTable`] exists for
//! in-process use (the dispatcher's `handle`, the CLI and tests): each
//! resolved route's `:name` template is compiled into an anchored regex at
//! startup and requests are matched against the table in resolution order.
//!
//! ```rust
//! use contract_router::contract::{AppRoute, HttpMethod};
//! use contract_router::dispatcher::RouteHandler;
//! use contract_router::resolver::ResolvedRoute;
//! use contract_router::response::HandlerResponse;
//! use contract_router::router::RouteTable;
//! use std::sync::Arc;
//!
//! let entry = ResolvedRoute {
//!     prefix: vec!["getPost".into()],
//!     route: Arc::new(AppRoute::get("/posts/:id").build().unwrap()),
//!     handler: RouteHandler::sync(|_| Ok(HandlerResponse::empty(200))),
//! };
//! let table = RouteTable::new(vec![entry]).unwrap();
//! let m = table.route(HttpMethod::Get, "/posts/42").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! ```

mod core;

pub use core::{ParamVec, RouteMatch, RouteTable, RouteTableError, MAX_INLINE_PARAMS};
