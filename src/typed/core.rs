use crate::contract::{AppRoute, HttpMethod};
use crate::dispatcher::{HandlerRequest, RouteHandler};
use crate::response::HandlerResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

/// Trait implemented by typed route handlers.
///
/// The request slots have already been validated by the dispatcher; the
/// handler receives them deserialized into its associated types. Use
/// [`serde::de::IgnoredAny`] for a slot the handler does not read.
pub trait Handler: Send + Sync + 'static {
    type Params: DeserializeOwned + Send;
    type Query: DeserializeOwned + Send;
    type Body: DeserializeOwned + Send;
    /// Serialized to the JSON response body
    type Response: Serialize;

    fn handle(
        &self,
        req: TypedHandlerRequest<Self::Params, Self::Query, Self::Body>,
    ) -> impl Future<Output = anyhow::Result<TypedResponse<Self::Response>>> + Send;
}

/// Typed request data passed to a [`Handler`]
#[derive(Debug, Clone)]
pub struct TypedHandlerRequest<P, Q, B> {
    pub route: Arc<AppRoute>,
    pub method: HttpMethod,
    pub path: String,
    pub params: P,
    pub query: Q,
    pub body: B,
    /// Validated headers, kept untyped
    pub headers: Value,
}

impl<P, Q, B> TryFrom<HandlerRequest> for TypedHandlerRequest<P, Q, B>
where
    P: DeserializeOwned,
    Q: DeserializeOwned,
    B: DeserializeOwned,
{
    type Error = anyhow::Error;

    fn try_from(req: HandlerRequest) -> Result<Self, Self::Error> {
        use anyhow::Context;
        Ok(Self {
            params: serde_json::from_value(req.params).context("path parameters")?,
            query: serde_json::from_value(req.query).context("query")?,
            body: serde_json::from_value(req.body).context("body")?,
            route: req.route,
            method: req.method,
            path: req.path,
            headers: req.headers,
        })
    }
}

/// Status and typed body returned by a [`Handler`]
#[derive(Debug, Clone, PartialEq)]
pub struct TypedResponse<T> {
    pub status: u16,
    pub body: T,
}

impl<T> TypedResponse<T> {
    pub fn new(status: u16, body: T) -> Self {
        Self { status, body }
    }

    pub fn ok(body: T) -> Self {
        Self::new(200, body)
    }
}

/// Wrap a typed handler so it can be mounted in an implementation router.
///
/// Input that passed validation but does not deserialize into the handler's
/// types yields a 400 response.
pub fn into_route_handler<H: Handler>(handler: H) -> RouteHandler {
    let handler = Arc::new(handler);
    RouteHandler::new(move |req: HandlerRequest| {
        let handler = Arc::clone(&handler);
        async move {
            let typed = match TypedHandlerRequest::try_from(req) {
                Ok(typed) => typed,
                Err(err) => {
                    return Ok(HandlerResponse::json(
                        400,
                        json!({
                            "error": "Invalid request data",
                            "message": format!("{err:#}"),
                        }),
                    ))
                }
            };
            let response = handler.handle(typed).await?;
            let body = serde_json::to_value(response.body)?;
            Ok(HandlerResponse::json(response.status, body))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerOptions;
    use crate::contract::ContractRouter;
    use crate::dispatcher::Dispatcher;
    use crate::request::RawRequest;
    use crate::resolver::ImplRouter;
    use crate::response::ResponseBody;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Params {
        id: String,
    }

    #[derive(Deserialize)]
    struct Body {
        title: String,
    }

    #[derive(Serialize)]
    struct Post {
        id: String,
        title: String,
    }

    struct UpdatePost;

    impl Handler for UpdatePost {
        type Params = Params;
        type Query = serde::de::IgnoredAny;
        type Body = Body;
        type Response = Post;

        async fn handle(
            &self,
            req: TypedHandlerRequest<Params, serde::de::IgnoredAny, Body>,
        ) -> anyhow::Result<TypedResponse<Post>> {
            Ok(TypedResponse::ok(Post {
                id: req.params.id,
                title: req.body.title,
            }))
        }
    }

    fn dispatcher() -> Dispatcher {
        let contract = ContractRouter::new().route(
            "update",
            AppRoute::put("/posts/:id").body_unchecked().build().unwrap(),
        );
        let implementation = ImplRouter::new().handler("update", into_route_handler(UpdatePost));
        Dispatcher::from_router(&contract, &implementation, ServerOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn typed_handler_round_trip() {
        let out = dispatcher()
            .handle(RawRequest::new(HttpMethod::Put, "/posts/9").body(json!({ "title": "t" })))
            .await
            .unwrap();
        assert_eq!(out.response.status_code, 200);
        assert_eq!(
            out.response.body,
            ResponseBody::Json(json!({ "id": "9", "title": "t" }))
        );
    }

    #[tokio::test]
    async fn undeserializable_input_is_bad_request() {
        let out = dispatcher()
            .handle(RawRequest::new(HttpMethod::Put, "/posts/9").body(json!({ "title": 5 })))
            .await
            .unwrap();
        assert_eq!(out.response.status_code, 400);
        let body = out.response.json_body().unwrap();
        assert_eq!(body["error"], "Invalid request data");
    }
}
