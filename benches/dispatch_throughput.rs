#![allow(clippy::expect_used)]

use contract_router::config::ServerOptions;
use contract_router::contract::{parse_contract, ContractRouter, HttpMethod};
use contract_router::dispatcher::Dispatcher;
use contract_router::echo::echo_router;
use contract_router::request::RawRequest;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;

fn example_contract() -> &'static str {
    r#"
zoo:
  animals:
    list:
      method: GET
      path: /zoo/animals
      query:
        type: object
        properties:
          take: { type: integer }
          species: { type: string }
      responses:
        "200": null
    get:
      method: GET
      path: /zoo/animals/:id
      pathParams:
        type: object
        properties:
          id: { type: integer }
        required: [id]
      responses:
        "200":
          type: object
          properties:
            operation: { type: string }
            params: { type: object }
        "404": null
    create:
      method: POST
      path: /zoo/animals
      body:
        type: object
        properties:
          name: { type: string }
          species: { type: string }
          age: { type: integer, minimum: 0 }
        required: [name, species]
      responses:
        "201": null
    toys:
      method: GET
      path: /zoo/animals/:id/toys/:toy_id
      responses:
        "200": null
  habitats:
    section:
      method: GET
      path: /zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id
      responses:
        "200": null
inventory:
  batch:
    method: POST
    path: /inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id
    body: null
    responses:
      "200": null
"#
}

fn parse(yaml: &str) -> ContractRouter {
    let document = serde_yaml::from_str(yaml).expect("failed to parse YAML contract");
    parse_contract(&document).expect("invalid contract")
}

fn dispatcher(options: ServerOptions) -> Dispatcher {
    let contract = parse(example_contract());
    Dispatcher::from_router(&contract, &echo_router(&contract), options)
        .expect("failed to resolve contract")
}

fn bench_route_match(c: &mut Criterion) {
    let dispatcher = dispatcher(ServerOptions::default());
    let test_paths = [
        (HttpMethod::Get, "/zoo/animals/123"),
        (HttpMethod::Get, "/zoo/animals/123/toys/456"),
        (HttpMethod::Get, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (HttpMethod::Post, "/inventory/1/feeds/2/items/3/batches/4"),
        (HttpMethod::Get, "/zoo/animals?take=10"),
    ];
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = dispatcher.route(*method, path);
                black_box(&res);
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");

    let plain = dispatcher(ServerOptions::default());
    let validating = dispatcher(ServerOptions {
        validate_responses: true,
        ..ServerOptions::default()
    });

    c.bench_function("dispatch_get_with_path_params", |b| {
        b.iter(|| {
            let out = runtime.block_on(plain.handle(RawRequest::new(HttpMethod::Get, "/zoo/animals/42")));
            black_box(out)
        })
    });

    c.bench_function("dispatch_get_validated_response", |b| {
        b.iter(|| {
            let out =
                runtime.block_on(validating.handle(RawRequest::new(HttpMethod::Get, "/zoo/animals/42")));
            black_box(out)
        })
    });

    c.bench_function("dispatch_query_decoding", |b| {
        b.iter(|| {
            let raw = RawRequest::new(HttpMethod::Get, "/zoo/animals").query_string("take=10&species=otter");
            black_box(runtime.block_on(plain.handle(raw)))
        })
    });

    let body = json!({ "name": "Pip", "species": "otter", "age": 3 });
    c.bench_function("dispatch_post_body", |b| {
        b.iter(|| {
            let raw = RawRequest::new(HttpMethod::Post, "/zoo/animals").body(body.clone());
            black_box(runtime.block_on(plain.handle(raw)))
        })
    });

    c.bench_function("dispatch_invalid_body", |b| {
        b.iter(|| {
            let raw = RawRequest::new(HttpMethod::Post, "/zoo/animals").body(json!({ "age": -1 }));
            black_box(runtime.block_on(plain.handle(raw)))
        })
    });
}

criterion_group!(benches, bench_route_match, bench_dispatch);
criterion_main!(benches);
