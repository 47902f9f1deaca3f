use axum::routing::get;
use axum::Router;

use crate::handlers::sections;
use crate::state::AppState;

/// Routes mounted at `/sections`. Writes live under `/admin/sections`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sections::list_sections))
        .route("/{id}", get(sections::get_section))
}
