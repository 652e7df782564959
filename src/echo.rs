use crate::contract::{ContractNode, ContractRouter, ResponseSpec};
use crate::dispatcher::{HandlerRequest, RouteHandler};
use crate::resolver::{ImplNode, ImplRouter};
use crate::response::HandlerResponse;
use serde_json::json;

/// Echoes the validated request back as JSON.
///
/// Responds with the lowest declared 2xx status (200 if none is declared).
pub fn echo_handler(req: HandlerRequest) -> anyhow::Result<HandlerResponse> {
    let status = req
        .route
        .responses
        .iter()
        .find(|(status, spec)| (200..300).contains(*status) && !matches!(spec, ResponseSpec::NoBody))
        .map(|(status, _)| *status)
        .or_else(|| req.route.responses.keys().copied().find(|s| (200..300).contains(s)))
        .unwrap_or(200);
    Ok(HandlerResponse::json(
        status,
        json!({
            "operation": req.operation(),
            "method": req.method.as_str(),
            "path": req.path,
            "params": req.params,
            "query": req.query,
            "headers": req.headers,
            "body": req.body,
        }),
    ))
}

/// Implementation tree with [`echo_handler`] mounted at every contract route.
pub fn echo_router(contract: &ContractRouter) -> ImplRouter {
    let mut router = ImplRouter::new();
    for (key, node) in contract.iter() {
        let imp = match node {
            ContractNode::Route(_) => ImplNode::Handler(RouteHandler::sync(echo_handler)),
            ContractNode::Router(sub) => ImplNode::Router(echo_router(sub)),
        };
        router.insert(key, imp);
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerOptions;
    use crate::contract::{AppRoute, HttpMethod};
    use crate::dispatcher::Dispatcher;
    use crate::request::RawRequest;

    #[tokio::test]
    async fn echoes_through_the_pipeline() {
        let contract = ContractRouter::new().router(
            "posts",
            ContractRouter::new().route(
                "create",
                AppRoute::post("/posts")
                    .body_unchecked()
                    .response_no_body(204)
                    .response_unchecked(201)
                    .build()
                    .unwrap(),
            ),
        );
        let dispatcher =
            Dispatcher::from_router(&contract, &echo_router(&contract), ServerOptions::default())
                .unwrap();
        let out = dispatcher
            .handle(
                RawRequest::new(HttpMethod::Post, "/posts")
                    .query_string("draft=1")
                    .body(json!({ "title": "t" })),
            )
            .await
            .unwrap();
        assert_eq!(out.response.status_code, 201);
        let body = out.response.json_body().unwrap();
        assert_eq!(body["operation"], "posts.create");
        assert_eq!(body["query"], json!({ "draft": "1" }));
        assert_eq!(body["body"], json!({ "title": "t" }));
    }
}
