//! # Typed Handlers
//!
//! Strongly typed handlers over validated request data.
//!
//! A [`Handler`] declares the types its path params, query and body
//! deserialize into, plus a serializable response type.
//! [`into_route_handler`] adapts it to a
//! [`RouteHandler`](crate::dispatcher::RouteHandler), so it mounts in an
//! implementation router like any other handler and goes through the same
//! validation and response shaping.
//!
//! ```rust,ignore
//! struct GetPost;
//!
//! impl Handler for GetPost {
//!     type Params = GetPostParams;
//!     type Query = serde::de::IgnoredAny;
//!     type Body = serde::de::IgnoredAny;
//!     type Response = Post;
//!
//!     async fn handle(&self, req: TypedHandlerRequest<GetPostParams, IgnoredAny, IgnoredAny>)
//!         -> anyhow::Result<TypedResponse<Post>>
//!     {
//!         Ok(TypedResponse::ok(load_post(&req.params.id)?))
//!     }
//! }
//!
//! let implementation = ImplRouter::new().handler("get", into_route_handler(GetPost));
//! ```

mod core;

pub use core::{into_route_handler, Handler, TypedHandlerRequest, TypedResponse};
