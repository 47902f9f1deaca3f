//! Route definitions for the `/reviews` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reviews;
use crate::state::AppState;

/// Routes mounted at `/reviews`.
///
/// ```text
/// GET  /                             -> list_reviews
/// POST /{slug}/{pending}/approve     -> approve
/// POST /{slug}/{pending}/reject      -> reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::list_reviews))
        .route("/{slug}/{pending}/approve", post(reviews::approve))
        .route("/{slug}/{pending}/reject", post(reviews::reject))
}
