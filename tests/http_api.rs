//! Router-level tests driven through tower's oneshot, no live socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use amagi::api::{router, AppState};
use amagi::chat::ChatOrchestrator;
use amagi::config::AmagiConfig;
use amagi::knowledge::InMemoryKnowledgeStore;
use amagi::memory::sqlite::run_migration;
use amagi::memory::SqliteStore;

async fn app() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    run_migration(&pool).await.unwrap();

    let store = Arc::new(SqliteStore::new(pool));
    let mut config = AmagiConfig::from_env();
    config.default_provider = "mock".to_string();

    let orchestrator = ChatOrchestrator::new(
        config,
        store.clone(),
        store,
        Arc::new(InMemoryKnowledgeStore::new()),
    );
    (router(Arc::new(AppState { orchestrator })), dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn personalities_lists_the_full_archetype_set() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(Request::get("/personalities").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    let list = body["personalities"].as_array().unwrap();
    assert_eq!(list.len(), 9);
    assert!(list.contains(&json!("tsundere")));
}

#[tokio::test]
async fn models_endpoints_list_provider_catalogs() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let catalogs = body["models"].as_array().unwrap();
    assert!(catalogs.iter().any(|c| c["provider"] == json!("mock")));

    let response = app
        .clone()
        .oneshot(Request::get("/models/mock").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["models"].as_array().unwrap().is_empty());
    assert_eq!(body["defaultModel"], json!("mock-chat-model"));

    let response = app
        .oneshot(Request::get("/models/quantum").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/chat", json!({ "message": "  ", "userId": "u1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_turn_returns_full_payload() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/chat", json!({ "message": "你好", "userId": "u1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(!body["replyText"].as_str().unwrap().is_empty());
    assert!(!body["sessionId"].as_str().unwrap().is_empty());
    assert_eq!(body["persona"]["archetype"], json!("gentle"));
    assert!(body["emotion"]["confidence"].as_f64().unwrap() <= 0.9);
    assert!(body["worldviewInfluence"]["score"].as_f64().is_some());
}

#[tokio::test]
async fn missing_session_summary_is_404() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(
            Request::get("/sessions/no-such-session/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error_code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn worldview_update_then_summary_round_trips() {
    let (app, _dir) = app().await;

    let update = Request::builder()
        .method("PUT")
        .uri("/worldview/u1")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "category": "taboos", "keywords": ["背叛"], "weight": 1.0 }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let categories = body["categories"].as_array().unwrap();
    let taboos = categories
        .iter()
        .find(|c| c["category"] == json!("taboos"))
        .unwrap();
    assert_eq!(taboos["keywords"], json!(["背叛"]));
}

#[tokio::test]
async fn bot_profile_update_is_partial() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/bot-profile")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": "小雪" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], json!("小雪"));
    // Untouched fields keep their configured defaults.
    assert_eq!(body["archetype"], json!("gentle"));
}
