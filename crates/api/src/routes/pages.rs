//! Route definitions for the `/pages` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Routes mounted at `/pages`.
///
/// ```text
/// GET  /                              -> list_pages
/// GET  /{slug}                        -> get_page
/// PUT  /{slug}                        -> save_page
/// GET  /{slug}/history                -> get_history
/// GET  /{slug}/revisions/{version}    -> get_revision
/// GET  /{slug}/diff                   -> diff_revisions
/// POST /{slug}/revert/{version}       -> revert_page
/// PUT  /{slug}/review-policy          -> set_review_policy
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::list_pages))
        .route("/{slug}", get(pages::get_page).put(pages::save_page))
        .route("/{slug}/history", get(pages::get_history))
        .route("/{slug}/revisions/{version}", get(pages::get_revision))
        .route("/{slug}/diff", get(pages::diff_revisions))
        .route("/{slug}/revert/{version}", post(pages::revert_page))
        .route("/{slug}/review-policy", put(pages::set_review_policy))
}
