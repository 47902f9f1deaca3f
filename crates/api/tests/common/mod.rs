#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use quire_api::auth::jwt::{generate_access_token, JwtConfig};
use quire_api::config::{ServerConfig, StorageBackend};
use quire_api::router::build_app_router;
use quire_api::state::AppState;
use quire_core::snapshot;
use quire_core::store::memory::MemoryStore;
use quire_core::workflow::WikiService;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".parse().unwrap()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        storage: StorageBackend::Memory,
        seed_path: None,
        default_section: "general".to_string(),
        bootstrap_admin: None,
        min_password_length: 8,
    }
}

/// Full router over a freshly seeded `MemoryStore`, plus the store itself so
/// tests can arrange state directly.
///
/// Seed: `u1` Alice (admin), `u2` Bob (editor), `u3` Charlie (viewer);
/// sections `general` (no review) and `restricted` (review, admin approves);
/// page `home` in `general` at version 1.
pub async fn build_test_app_with_store() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    snapshot::import(&*store, snapshot::seed())
        .await
        .expect("seed import should succeed");

    let config = test_config();
    let state = AppState {
        wiki: Arc::new(WikiService::new(store.clone(), config.default_section.clone())),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

pub async fn build_test_app() -> Router {
    build_test_app_with_store().await.0
}

/// Bearer token for `user_id`, signed with the test secret.
pub fn token(user_id: &str) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, user_id: &str) -> Response {
    send(app, Method::GET, uri, Some(user_id), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, user_id: &str) -> Response {
    send(app, Method::POST, uri, Some(user_id), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    user_id: &str,
    body: serde_json::Value,
) -> Response {
    send(app, Method::POST, uri, Some(user_id), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    user_id: &str,
    body: serde_json::Value,
) -> Response {
    send(app, Method::PUT, uri, Some(user_id), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, user_id: &str) -> Response {
    send(app, Method::DELETE, uri, Some(user_id), None).await
}

/// Collect the body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Save `content` to `slug` as `user_id` and return the `data` object.
pub async fn save_page(
    app: Router,
    user_id: &str,
    slug: &str,
    body: serde_json::Value,
) -> (axum::http::StatusCode, serde_json::Value) {
    let response = put_json_auth(app, &format!("/api/v1/pages/{slug}"), user_id, body).await;
    let status = response.status();
    (status, body_json(response).await)
}
