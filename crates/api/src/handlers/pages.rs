//! Handlers for the `/pages` resource: reads, saves, history, diff, revert,
//! and the page-level review override.

use axum::extract::{Path, Query, State};
use axum::Json;
use quire_core::diff::DiffLine;
use quire_core::page::{PageSummary, PageView, PendingRevision, Revision};
use quire_core::types::{SectionId, Version};
use quire_core::workflow::{SaveOutcome, SaveRequest, SaveStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /pages/{slug}`.
#[derive(Debug, Deserialize, Validate)]
pub struct SavePageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: String,
    /// Omitted: keep the page's section, or the default section for a new page.
    pub section_id: Option<SectionId>,
}

/// Request body for `PUT /pages/{slug}/review-policy`.
#[derive(Debug, Deserialize)]
pub struct ReviewPolicyRequest {
    pub review_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub from: Version,
    pub to: Version,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: SaveStatus,
    pub page: PageView,
    pub revision: Option<Revision>,
    pub pending: Option<PendingRevision>,
}

impl From<SaveOutcome> for SaveResponse {
    fn from(outcome: SaveOutcome) -> Self {
        Self {
            status: outcome.status,
            page: outcome.page.into_view(),
            revision: outcome.revision,
            pending: outcome.pending,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub slug: String,
    pub from: Version,
    pub to: Version,
    pub lines: Vec<DiffLine>,
}

fn log_save(action: &'static str, user_id: &str, slug: &str, response: &SaveResponse) {
    tracing::info!(
        user_id,
        slug,
        status = ?response.status,
        version = ?response.revision.as_ref().map(|r| r.version),
        pending_id = ?response.pending.as_ref().map(|p| p.id),
        "{action}"
    );
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/pages
pub async fn list_pages(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<PageSummary>>>> {
    let pages = state.wiki.list_pages(&auth.user_id).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// GET /api/v1/pages/{slug}
pub async fn get_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = state.wiki.get_page(&slug, &auth.user_id).await?;
    Ok(Json(DataResponse {
        data: page.into_view(),
    }))
}

/// PUT /api/v1/pages/{slug}
///
/// Publishes immediately or queues a pending revision, depending on the
/// target section's and the page's review policy.
pub async fn save_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(input): Json<SavePageRequest>,
) -> AppResult<Json<DataResponse<SaveResponse>>> {
    input.validate()?;

    let outcome = state
        .wiki
        .save(
            &auth.user_id,
            SaveRequest {
                slug: slug.clone(),
                title: input.title,
                content: input.content,
                section_id: input.section_id,
            },
        )
        .await?;

    let response = SaveResponse::from(outcome);
    log_save("Page saved", &auth.user_id, &slug, &response);
    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/pages/{slug}/history
pub async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Revision>>>> {
    let revisions = state.wiki.get_history(&slug, &auth.user_id).await?;
    Ok(Json(DataResponse { data: revisions }))
}

/// GET /api/v1/pages/{slug}/revisions/{version}
pub async fn get_revision(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, version)): Path<(String, Version)>,
) -> AppResult<Json<DataResponse<Revision>>> {
    let revision = state
        .wiki
        .get_revision(&slug, version, &auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: revision }))
}

/// GET /api/v1/pages/{slug}/diff?from=&to=
pub async fn diff_revisions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Query(query): Query<DiffQuery>,
) -> AppResult<Json<DataResponse<DiffResponse>>> {
    let lines = state
        .wiki
        .diff_revisions(&slug, query.from, query.to, &auth.user_id)
        .await?;
    Ok(Json(DataResponse {
        data: DiffResponse {
            slug,
            from: query.from,
            to: query.to,
            lines,
        },
    }))
}

/// POST /api/v1/pages/{slug}/revert/{version}
///
/// Re-saves the content of an earlier version; subject to the same review
/// gate as any other save.
pub async fn revert_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, version)): Path<(String, Version)>,
) -> AppResult<Json<DataResponse<SaveResponse>>> {
    let outcome = state.wiki.revert(&slug, version, &auth.user_id).await?;

    let response = SaveResponse::from(outcome);
    log_save("Page reverted", &auth.user_id, &slug, &response);
    Ok(Json(DataResponse { data: response }))
}

/// PUT /api/v1/pages/{slug}/review-policy
pub async fn set_review_policy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(input): Json<ReviewPolicyRequest>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = state
        .wiki
        .set_review_policy(&slug, input.review_required, &auth.user_id)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        slug = %slug,
        review_required = input.review_required,
        "Page review policy updated"
    );
    Ok(Json(DataResponse {
        data: page.into_view(),
    }))
}
