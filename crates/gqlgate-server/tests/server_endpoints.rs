use std::sync::Arc;

use gqlgate_graphql::ServiceRegistry;
use gqlgate_server::{AppConfig, build_app};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let cfg = AppConfig::default();
    let registry = Arc::new(ServiceRegistry::new(&cfg.gateway).expect("registry"));
    let app = build_app(&cfg, registry);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

/// Mock catalog service that serves its own Swagger description. The
/// document has no `host`, so the gateway calls back to the mock's origin.
async fn start_catalog() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "swagger": "2.0",
            "info": { "title": "Catalog", "version": "1" },
            "definitions": {
                "Book": { "type": "object", "properties": {
                    "id": { "type": "integer" },
                    "title": { "type": "string" }
                }}
            },
            "paths": {
                "/books/{id}": { "get": {
                    "parameters": [{ "name": "id", "in": "path", "type": "string" }],
                    "responses": { "200": { "schema": { "$ref": "#/definitions/Book" } } }
                }}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "title": "Dune" })),
        )
        .mount(&server)
        .await;
    server
}

async fn graphql(client: &reqwest::Client, base: &str, query: &str) -> Value {
    let resp = client
        .post(format!("{base}/graphql"))
        .json(&json!({ "query": query }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    resp.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoints_work() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["service"], "gqlgate");
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/readyz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["services"], 0);

    let resp = client
        .get(format!("{base}/healthz"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn empty_gateway_answers_health_query() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let body = graphql(&client, &base, "{ _health }").await;
    assert_eq!(body["data"]["_health"], "ok");

    let resp = client.get(format!("{base}/registry")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["services"], json!([]));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn register_query_and_unregister_service() {
    let catalog = start_catalog().await;
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // POST /registry
    let resp = client
        .post(format!("{base}/registry"))
        .json(&json!({ "name": "catalog", "url": format!("{}/v2/api-docs", catalog.uri()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().is_empty());

    // GET /registry
    let body: Value = client
        .get(format!("{base}/registry"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["services"], json!(["catalog"]));

    // GET /graphql/sdl
    let resp = client.get(format!("{base}/graphql/sdl")).send().await.unwrap();
    assert!(resp.status().is_success());
    let sdl = resp.text().await.unwrap();
    assert!(sdl.contains("type Book"));
    assert!(sdl.contains("booksById"));

    // POST /graphql
    let body = graphql(&client, &base, r#"{ booksById(id: "42") { id title } }"#).await;
    assert_eq!(body["data"]["booksById"], json!({ "id": "42", "title": "Dune" }));

    // DELETE /registry
    let resp = client
        .delete(format!("{base}/registry?name=catalog"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let body = graphql(&client, &base, r#"{ booksById(id: "42") { title } }"#).await;
    assert!(body["errors"].is_array());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn registration_errors_are_reported() {
    let unavailable = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&unavailable)
        .await;
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/registry"))
        .json(&json!({ "name": "ghost", "url": format!("{}/v2/api-docs", unavailable.uri()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["extensions"]["code"], "DESCRIPTION_UNAVAILABLE");

    let resp = client
        .post(format!("{base}/registry"))
        .json(&json!({ "name": "", "url": "http://nowhere" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = client
        .get(format!("{base}/registry"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["services"], json!([]));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
