#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;

    /// Write `content` to a temp file with the given extension.
    ///
    /// The file is removed when the returned handle drops.
    pub fn create_temp_contract(content: &str, ext: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("contract_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        create_temp_contract(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> tempfile::NamedTempFile {
        create_temp_contract(content, "json")
    }
}

pub mod fixtures {
    use contract_router::contract::{AppRoute, ContractRouter};
    use contract_router::schema::JsonSchema;
    use serde_json::{json, Value};

    /// The blog API as a contract document.
    pub const BLOG_YAML: &str = r#"
posts:
  get:
    method: GET
    path: /posts/:id
    summary: Fetch one post
    pathParams:
      type: object
      properties:
        id: { type: string }
      required: [id]
    headers:
      type: object
      properties:
        authorization: { type: string }
    responses:
      200:
        type: object
        properties:
          id: { type: string }
          title: { type: string }
          content: { type: string }
        required: [id, title]
      404: null
  create:
    method: POST
    path: /posts
    body:
      type: object
      properties:
        title: { type: string }
        content: { type: string }
      required: [title]
    responses:
      201:
        type: object
        properties:
          id: { type: string }
          title: { type: string }
        required: [id, title]
      400:
        type: object
        properties:
          message: { type: string }
        required: [message]
  comments:
    list:
      method: GET
      path: /posts/:id/comments
      responses:
        200: null
health:
  method: GET
  path: /health
  responses:
    200:
      type: object
      properties:
        status: { type: string }
"#;

    pub fn post_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["id", "title"]
        })
    }

    fn schema(doc: Value) -> JsonSchema {
        JsonSchema::new(doc).unwrap()
    }

    fn wire_schema(doc: Value) -> JsonSchema {
        JsonSchema::coercing(doc).unwrap()
    }

    /// The blog API built in code.
    pub fn blog_contract() -> ContractRouter {
        let posts = ContractRouter::new()
            .route(
                "get",
                AppRoute::get("/posts/:id")
                    .path_params(wire_schema(json!({
                        "type": "object",
                        "properties": { "id": { "type": "string" } },
                        "required": ["id"]
                    })))
                    .headers(wire_schema(json!({
                        "type": "object",
                        "properties": { "authorization": { "type": "string" } }
                    })))
                    .response(200, schema(post_schema()))
                    .response_unchecked(404)
                    .build()
                    .unwrap(),
            )
            .route(
                "list",
                AppRoute::get("/posts")
                    .query(wire_schema(json!({
                        "type": "object",
                        "properties": {
                            "take": { "type": "integer" },
                            "filter": {
                                "type": "object",
                                "properties": {
                                    "tags": { "type": "array", "items": { "type": "string" } },
                                    "published": { "type": "boolean" }
                                }
                            }
                        }
                    })))
                    .response_unchecked(200)
                    .build()
                    .unwrap(),
            )
            .route(
                "create",
                AppRoute::post("/posts")
                    .body(schema(json!({
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "content": { "type": "string" }
                        },
                        "required": ["title"]
                    })))
                    .response(201, schema(post_schema()))
                    .response(
                        400,
                        schema(json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                    )
                    .build()
                    .unwrap(),
            )
            .route(
                "remove",
                AppRoute::delete("/posts/:id")
                    .no_body()
                    .response_no_body(204)
                    .build()
                    .unwrap(),
            );

        ContractRouter::new().router("posts", posts).route(
            "health",
            AppRoute::get("/health")
                .response(
                    200,
                    schema(json!({
                        "type": "object",
                        "properties": { "status": { "type": "string" } }
                    })),
                )
                .build()
                .unwrap(),
        )
    }
}
