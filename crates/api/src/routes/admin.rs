//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users             -> list_users
/// POST   /users             -> create_user
/// GET    /users/{id}        -> get_user
/// PUT    /users/{id}        -> update_user
/// DELETE /users/{id}        -> delete_user
///
/// GET    /groups            -> list_groups
/// POST   /groups            -> create_group
/// PUT    /groups/{id}       -> update_group
/// DELETE /groups/{id}       -> delete_group
///
/// POST   /sections          -> create_section
/// PUT    /sections/{id}     -> update_section
/// DELETE /sections/{id}     -> delete_section
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/groups", get(admin::list_groups).post(admin::create_group))
        .route(
            "/groups/{id}",
            put(admin::update_group).delete(admin::delete_group),
        )
        .route("/sections", post(admin::create_section))
        .route(
            "/sections/{id}",
            put(admin::update_section).delete(admin::delete_section),
        )
}
