//! HTTP-level integration tests for pages, history, and the review workflow.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get, get_auth, post_auth, put_json_auth, save_page,
};
use quire_core::store::DirectoryStore;
use serde_json::json;

// ---------------------------------------------------------------------------
// Authentication edge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pages_require_a_token() {
    let app = common::build_test_app().await;
    let response = get(app, "/api/v1/pages").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() {
    let (app, store) = common::build_test_app_with_store().await;
    store.delete_user("u3").await.unwrap();

    let response = get_auth(app, "/api/v1/pages", "u3").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn viewer_lists_only_readable_pages() {
    let app = common::build_test_app().await;
    let (status, _) = save_page(
        app.clone(),
        "u2",
        "secret-plan",
        json!({ "title": "Plan", "content": "x", "section_id": "restricted" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json = body_json(get_auth(app.clone(), "/api/v1/pages", "u3").await).await;
    let slugs: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["home"]);

    let json = body_json(get_auth(app, "/api/v1/pages", "u2").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_page_includes_head_revision() {
    let app = common::build_test_app().await;
    let response = get_auth(app, "/api/v1/pages/home", "u3").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "home");
    assert_eq!(json["data"]["status"], "published");
    assert_eq!(json["data"]["current_revision"]["version"], 1);
    assert!(json["data"].get("row_version").is_none());
}

#[tokio::test]
async fn unknown_page_is_404() {
    let app = common::build_test_app().await;
    let response = get_auth(app, "/api/v1/pages/missing", "u1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewer_cannot_read_restricted_page() {
    let app = common::build_test_app().await;
    save_page(
        app.clone(),
        "u1",
        "ops",
        json!({ "title": "Ops", "content": "x", "section_id": "restricted" }),
    )
    .await;

    let response = get_auth(app, "/api/v1/pages/ops", "u3").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["reason"], "not_reader");
}

// ---------------------------------------------------------------------------
// Saves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn editor_publishes_directly_in_unreviewed_section() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(
        app.clone(),
        "u2",
        "home",
        json!({ "title": "Home", "content": "# Welcome\n\nEdited" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "published");
    assert_eq!(json["data"]["revision"]["version"], 2);
    assert_eq!(json["data"]["revision"]["author_id"], "u2");
    assert!(json["data"]["pending"].is_null());

    let history = body_json(get_auth(app, "/api/v1/pages/home/history", "u3").await).await;
    let versions: Vec<i64> = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["version"].as_i64().unwrap())
        .collect();
    assert_eq!(versions, [2, 1]);
}

#[tokio::test]
async fn viewer_cannot_save() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(
        app,
        "u3",
        "home",
        json!({ "title": "Home", "content": "vandalism" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["reason"], "not_writer");
}

#[tokio::test]
async fn unknown_section_is_422() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(
        app,
        "u1",
        "lost",
        json!({ "title": "Lost", "content": "x", "section_id": "nowhere" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INVALID_SECTION");
}

#[tokio::test]
async fn malformed_slug_is_400() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(
        app,
        "u1",
        "Not_A_Slug",
        json!({ "title": "Bad", "content": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn empty_title_is_rejected_before_the_engine() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(app, "u1", "home", json!({ "title": "", "content": "x" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Review workflow
// ---------------------------------------------------------------------------

/// Queue a proposal by `u2` for a new page in `restricted`; returns the pending id.
async fn queue_restricted_page(app: axum::Router) -> String {
    let (status, json) = save_page(
        app,
        "u2",
        "roadmap",
        json!({ "title": "Roadmap", "content": "Q3", "section_id": "restricted" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["page"]["status"], "unpublished");
    json["data"]["pending"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn pending_revision_is_approved_into_version_one() {
    let app = common::build_test_app().await;
    let pending_id = queue_restricted_page(app.clone()).await;

    let reviews = body_json(get_auth(app.clone(), "/api/v1/reviews", "u1").await).await;
    let items = reviews["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["slug"], "roadmap");
    assert_eq!(items[0]["destination_section_id"], "restricted");
    assert_eq!(items[0]["pending"]["id"], pending_id.as_str());

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/reviews/roadmap/{pending_id}/approve"),
        "u1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "published");
    assert_eq!(json["data"]["current_revision"]["version"], 1);
    assert_eq!(json["data"]["current_revision"]["author_id"], "u2");
    assert_eq!(json["data"]["current_revision"]["approved_by"], "u1");
    assert!(json["data"]["pending_revisions"].as_array().unwrap().is_empty());

    let reviews = body_json(get_auth(app, "/api/v1/reviews", "u1").await).await;
    assert!(reviews["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn editor_does_not_see_the_review_queue() {
    let app = common::build_test_app().await;
    queue_restricted_page(app.clone()).await;

    let reviews = body_json(get_auth(app, "/api/v1/reviews", "u2").await).await;
    assert!(reviews["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn author_cannot_approve_own_revision() {
    let app = common::build_test_app().await;
    let pending_id = queue_restricted_page(app.clone()).await;

    let response = post_auth(
        app,
        &format!("/api/v1/reviews/roadmap/{pending_id}/approve"),
        "u2",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["reason"], "self_approval");
}

#[tokio::test]
async fn admin_cannot_approve_own_revision() {
    let app = common::build_test_app().await;
    let (_, json) = save_page(
        app.clone(),
        "u1",
        "policy",
        json!({ "title": "Policy", "content": "x", "section_id": "restricted" }),
    )
    .await;
    let pending_id = json["data"]["pending"]["id"].as_str().unwrap().to_string();

    let response = post_auth(
        app,
        &format!("/api/v1/reviews/policy/{pending_id}/approve"),
        "u1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["reason"], "self_approval");
}

#[tokio::test]
async fn non_approver_cannot_decide() {
    let app = common::build_test_app().await;
    let pending_id = queue_restricted_page(app.clone()).await;

    let response = post_auth(
        app,
        &format!("/api/v1/reviews/roadmap/{pending_id}/reject"),
        "u3",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["reason"], "not_approver");
}

#[tokio::test]
async fn reject_by_queue_index_leaves_page_unpublished() {
    let app = common::build_test_app().await;
    queue_restricted_page(app.clone()).await;

    let response = post_auth(app.clone(), "/api/v1/reviews/roadmap/0/reject", "u1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "unpublished");
    assert!(json["data"]["pending_revisions"].as_array().unwrap().is_empty());

    let response = post_auth(app, "/api/v1/reviews/roadmap/0/reject", "u1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn garbage_pending_handle_is_400() {
    let app = common::build_test_app().await;
    let response = post_auth(app, "/api/v1/reviews/home/not-an-id/approve", "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn move_into_reviewed_section_waits_for_approval() {
    let app = common::build_test_app().await;
    let (status, json) = save_page(
        app.clone(),
        "u2",
        "home",
        json!({ "title": "Home", "content": "moved", "section_id": "restricted" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["pending"]["section_id"], "restricted");
    // Published location is unchanged until approval.
    assert_eq!(json["data"]["page"]["section_id"], "general");

    let page = body_json(get_auth(app, "/api/v1/pages/home", "u3").await).await;
    assert_eq!(page["data"]["section_id"], "general");
    assert_eq!(page["data"]["current_revision"]["version"], 1);
}

// ---------------------------------------------------------------------------
// Revisions, diff, revert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revert_republishes_old_content_as_new_version() {
    let app = common::build_test_app().await;
    let original = body_json(get_auth(app.clone(), "/api/v1/pages/home/revisions/1", "u2").await)
        .await["data"]["content"]
        .clone();
    save_page(
        app.clone(),
        "u2",
        "home",
        json!({ "title": "Home", "content": "scribbles" }),
    )
    .await;

    let response = post_auth(app.clone(), "/api/v1/pages/home/revert/1", "u2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "published");
    assert_eq!(json["data"]["revision"]["version"], 3);
    assert_eq!(json["data"]["revision"]["content"], original);

    let response = post_auth(app, "/api/v1/pages/home/revert/9", "u2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn diff_between_versions() {
    let app = common::build_test_app().await;
    save_page(
        app.clone(),
        "u2",
        "home",
        json!({ "title": "Home", "content": "# Welcome\n\nNew body" }),
    )
    .await;

    let response = get_auth(app, "/api/v1/pages/home/diff?from=1&to=2", "u3").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let lines = json["data"]["lines"].as_array().unwrap();
    assert_eq!(lines[0]["op"], "unchanged");
    assert_eq!(lines[0]["content"], "# Welcome");
    assert!(lines.iter().any(|l| l["op"] == "added" && l["content"] == "New body"));
    assert!(lines.iter().any(|l| l["op"] == "removed"));
}

#[tokio::test]
async fn unknown_revision_is_404() {
    let app = common::build_test_app().await;
    let response = get_auth(app, "/api/v1/pages/home/revisions/42", "u3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Page-level review override
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_review_override_forces_pending() {
    let app = common::build_test_app().await;

    let response = put_json_auth(
        app.clone(),
        "/api/v1/pages/home/review-policy",
        "u2",
        json!({ "review_required": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app.clone(),
        "/api/v1/pages/home/review-policy",
        "u1",
        json!({ "review_required": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["review_required"], true);

    let (_, json) = save_page(
        app,
        "u2",
        "home",
        json!({ "title": "Home", "content": "needs a look" }),
    )
    .await;
    assert_eq!(json["data"]["status"], "pending");
}
