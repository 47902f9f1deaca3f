//! Handlers for the `/reviews` resource: the approver queue and decisions.

use axum::extract::{Path, State};
use axum::Json;
use quire_core::page::{PageView, PendingRef};
use quire_core::workflow::ReviewItem;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/reviews
///
/// Pending revisions whose destination section the caller may approve,
/// oldest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ReviewItem>>>> {
    let items = state.wiki.list_reviews(&auth.user_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/reviews/{slug}/{pending}/approve
///
/// `pending` is a pending revision id or a queue index.
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, pending)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let pending: PendingRef = pending.parse()?;
    let page = state.wiki.approve(&slug, pending, &auth.user_id).await?;

    tracing::info!(
        user_id = %auth.user_id,
        slug = %slug,
        pending = %pending,
        version = page.head_version(),
        "Pending revision approved"
    );
    Ok(Json(DataResponse {
        data: page.into_view(),
    }))
}

/// POST /api/v1/reviews/{slug}/{pending}/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, pending)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let pending: PendingRef = pending.parse()?;
    let page = state.wiki.reject(&slug, pending, &auth.user_id).await?;

    tracing::info!(
        user_id = %auth.user_id,
        slug = %slug,
        pending = %pending,
        remaining = page.pending_revisions.len(),
        "Pending revision rejected"
    );
    Ok(Json(DataResponse {
        data: page.into_view(),
    }))
}
