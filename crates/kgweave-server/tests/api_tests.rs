use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{self, Request, StatusCode},
    Router,
};
use mockall::mock;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use kgweave_content_store::InMemoryBlobStore;
use kgweave_server::{api::build_router, KgweaveServer, ServerConfig, ServerResult};

// Mock the completion source
mock! {
    pub Completion {}

    #[async_trait]
    impl kgweave_server::CompletionSource for Completion {
        async fn complete(&self, prompt: &str) -> ServerResult<String>;
    }
}

impl std::fmt::Debug for MockCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCompletion").finish()
    }
}

const MODEL_OUTPUT: &str = "\
Here you go:
1. (Paris, capitalOf, France)
2. (France, locatedIn, Europe)
garbage line
3. (Paris, capitalOf, France)";

fn setup_with(completion: MockCompletion) -> Router {
    let server = KgweaveServer::new(
        ServerConfig::default(),
        Arc::new(InMemoryBlobStore::new()),
        Arc::new(completion),
    )
    .unwrap();
    build_router(Arc::new(server))
}

fn setup() -> Router {
    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .returning(|_| Ok(MODEL_OUTPUT.to_string()));
    setup_with(completion)
}

async fn send(app: &Router, method: http::Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_document_store() {
    let app = setup();
    let (status, body) = send(&app, http::Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["dependencies"]["documentStore"]["status"], "UP");
}

#[tokio::test]
async fn generate_merges_model_output() {
    let app = setup();
    let (status, body) = send(
        &app,
        http::Method::POST,
        "/api/graph/generate",
        Some(json!({ "prompt": "capitals of Europe" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triplesAdded"], 3);
    assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["edges"].as_array().unwrap().len(), 2);
    assert_eq!(body["prompt"], "capitals of Europe");

    // Same output again adds nothing.
    let (_, again) = send(
        &app,
        http::Method::POST,
        "/api/graph/generate",
        Some(json!({ "prompt": "capitals of Europe" })),
    )
    .await;
    assert_eq!(again["merge"]["nodesAdded"], 0);
    assert_eq!(again["edges"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn completion_failure_is_bad_gateway() {
    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .returning(|_| Err(kgweave_server::ServerError::CompletionError("status 500".to_string())));
    let app = setup_with(completion);

    let (status, body) = send(&app, http::Method::POST, "/api/graph/generate", Some(json!({ "prompt": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "ERR_COMPLETION_ERROR");

    let (_, graph) = send(&app, http::Method::GET, "/api/graph", None).await;
    assert!(graph["nodes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn import_accepts_tuple_records_and_round_trips_export() {
    let app = setup();
    let (status, body) = send(
        &app,
        http::Method::POST,
        "/api/graph/import",
        Some(json!([{ "from": "Paris", "rel": "capitalOf", "to": "France" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merge"]["edgesAdded"], 1);

    let (_, tuples) = send(&app, http::Method::GET, "/api/graph/export/tuples", None).await;
    assert_eq!(tuples, json!([{ "subject": "Paris", "relation": "capitalOf", "object": "France" }]));

    let (_, exported) = send(&app, http::Method::GET, "/api/graph/export", None).await;
    let fresh = setup();
    send(&fresh, http::Method::POST, "/api/graph/import", Some(exported.clone())).await;
    let (_, reimported) = send(&fresh, http::Method::GET, "/api/graph/export", None).await;
    assert_eq!(reimported["nodes"], exported["nodes"]);
    assert_eq!(reimported["edges"], exported["edges"]);
}

#[tokio::test]
async fn import_rejects_unknown_shapes() {
    let app = setup();
    let (status, body) = send(&app, http::Method::POST, "/api/graph/import", Some(json!({ "foo": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ERR_MALFORMED_IMPORT");
}

#[tokio::test]
async fn layout_and_clear() {
    let app = setup();
    send(&app, http::Method::POST, "/api/graph/generate", Some(json!({ "prompt": "p" }))).await;

    let (status, body) = send(&app, http::Method::PUT, "/api/graph/layout", Some(json!({ "layout": "Circle" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layout"], "AVSDF");

    let (status, _) = send(&app, http::Method::PUT, "/api/graph/layout", Some(json!({ "layout": "spiral" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, http::Method::POST, "/api/graph/clear", None).await;
    let (_, graph) = send(&app, http::Method::GET, "/api/graph", None).await;
    assert!(graph["nodes"].as_array().unwrap().is_empty());
    assert_eq!(graph["layout"], "AVSDF");
}

#[tokio::test]
async fn document_lifecycle() {
    let app = setup();
    send(&app, http::Method::POST, "/api/graph/generate", Some(json!({ "prompt": "capitals" }))).await;

    let (status, created) = send(&app, http::Method::POST, "/api/documents", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["file"]["name"], "kg-capitals.json");
    let id = created["file"]["id"].as_str().unwrap().to_string();

    let (_, listed) = send(&app, http::Method::GET, "/api/documents", None).await;
    assert_eq!(listed["ok"], true);
    assert_eq!(listed["files"][0]["id"], id.as_str());

    send(&app, http::Method::POST, "/api/graph/clear", None).await;
    let (status, opened) = send(&app, http::Method::GET, &format!("/api/documents/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opened["content"]["edges"].as_array().unwrap().len(), 2);

    let (status, copy) = send(&app, http::Method::POST, &format!("/api/documents/{}/save-as", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["file"]["name"], "copy-kg-capitals.json");

    let (status, saved) = send(&app, http::Method::PUT, &format!("/api/documents/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["file"]["id"], id.as_str());

    let (status, latest) = send(&app, http::Method::POST, "/api/documents/latest/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["file"]["id"], id.as_str());
}

#[tokio::test]
async fn undo_validates_timestamp_and_restores() {
    let app = setup();
    let (_, created) = send(&app, http::Method::POST, "/api/documents", Some(json!({ "name": "kg-empty.json" }))).await;
    let id = created["file"]["id"].as_str().unwrap().to_string();
    let undo = format!("/api/documents/{}/undo", id);

    let (status, _) = send(&app, http::Method::POST, &undo, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, http::Method::POST, &undo, Some(json!({ "timestampIso": "not a date" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        http::Method::POST,
        &undo,
        Some(json!({ "timestampIso": "2000-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ERR_NO_REVISION_FOUND");

    // Save a bigger graph, then go back to the empty first revision.
    send(&app, http::Method::POST, "/api/graph/generate", Some(json!({ "prompt": "capitals" }))).await;
    let (_, saved) = send(&app, http::Method::PUT, &format!("/api/documents/{}", id), None).await;
    assert_eq!(saved["ok"], true);

    let first_save = created["file"]["modifiedTime"].as_str().unwrap();
    let (status, restored) = send(&app, http::Method::POST, &undo, Some(json!({ "timestampIso": first_save }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(restored["restoredFromRevision"].is_string());
    assert!(restored["content"]["nodes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let app = setup();
    send(&app, http::Method::POST, "/api/graph/generate", Some(json!({ "prompt": "capitals" }))).await;
    let (_, before) = send(&app, http::Method::GET, "/api/graph", None).await;

    let (status, body) = send(&app, http::Method::GET, "/api/documents/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ERR_NOT_FOUND");

    let (status, _) = send(&app, http::Method::POST, "/api/documents/latest/open", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        http::Method::POST,
        "/api/documents/missing/undo",
        Some(json!({ "timestampIso": "2000-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, after) = send(&app, http::Method::GET, "/api/graph", None).await;
    assert_eq!(after, before);
    assert_eq!(after["edges"].as_array().unwrap().len(), 2);
}
