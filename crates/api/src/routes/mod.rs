pub mod admin;
pub mod auth;
pub mod health;
pub mod pages;
pub mod reviews;
pub mod sections;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/me                                         current identity
///
/// /pages                                           list readable pages
/// /pages/{slug}                                    get, save (PUT)
/// /pages/{slug}/history                            published chain, newest first
/// /pages/{slug}/revisions/{version}                one published revision
/// /pages/{slug}/diff?from=&to=                     line diff between two versions
/// /pages/{slug}/revert/{version}                   re-save an earlier version (POST)
/// /pages/{slug}/review-policy                      page-level review override (PUT)
///
/// /reviews                                         pending revisions the caller may decide
/// /reviews/{slug}/{pending}/approve                approve (POST)
/// /reviews/{slug}/{pending}/reject                 reject (POST)
///
/// /sections                                        list readable sections
/// /sections/{id}                                   get
///
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                get, update, delete
/// /admin/groups                                    list, create
/// /admin/groups/{id}                               update, delete
/// /admin/sections                                  create
/// /admin/sections/{id}                             update, delete
/// ```
///
/// Every route except `/auth/login` requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/pages", pages::router())
        .nest("/reviews", reviews::router())
        .nest("/sections", sections::router())
        .nest("/admin", admin::router())
}
