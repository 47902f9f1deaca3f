//! HTTP-level integration tests for login, `/auth/me`, health, and general
//! HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json};
use quire_api::bootstrap::ensure_admin;
use quire_api::config::BootstrapAdmin;
use serde_json::json;

async fn app_with_admin_password() -> axum::Router {
    let (app, store) = common::build_test_app_with_store().await;
    ensure_admin(
        &*store,
        &BootstrapAdmin {
            user_id: "u1".to_string(),
            password: "admin-password".to_string(),
        },
    )
    .await
    .expect("bootstrap should succeed");
    app
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_success_returns_token_and_groups() {
    let app = app_with_admin_password().await;
    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "user_id": "u1", "password": "admin-password" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    assert_eq!(json["data"]["expires_in"], 15 * 60);
    assert_eq!(json["data"]["user"]["id"], "u1");
    assert_eq!(json["data"]["user"]["groups"], json!(["admin"]));
}

#[tokio::test]
async fn login_wrong_password_is_401() {
    let app = app_with_admin_password().await;
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "user_id": "u1", "password": "incorrect" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_without_password_cannot_log_in() {
    let app = common::build_test_app().await;
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "user_id": "u2", "password": "anything" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_user_login_is_401() {
    let app = common::build_test_app().await;
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "user_id": "ghost", "password": "anything" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_reports_current_groups() {
    let app = common::build_test_app().await;
    let response = get_auth(app, "/api/v1/auth/me", "u2").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Bob");
    assert_eq!(json["data"]["groups"], json!(["editor"]));
}

#[tokio::test]
async fn forged_token_is_401() {
    let app = common::build_test_app().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/auth/me")
        .header("authorization", "Bearer not.a.jwt")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Health and routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app().await;
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app().await;
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
