//! Handlers for the `/admin` resource: users, groups, and section writes.
//!
//! The admin check itself lives in the engine; these handlers only shape
//! requests, hash passwords, and log.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use quire_core::admin::SectionWrite;
use quire_core::directory::{Group, GroupInput, User, UserInput};
use quire_core::section::SectionInput;
use quire_core::types::{GroupSet, SectionId};
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub groups: GroupSet,
    /// Omitted: the account exists for attribution but cannot log in.
    pub password: Option<String>,
}

/// Request body for `PUT /admin/users/{id}`. Replaces name and groups.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub groups: GroupSet,
    /// Omitted: keep the current password.
    pub password: Option<String>,
}

/// Request body for `POST /admin/groups`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[serde(flatten)]
    pub group: GroupInput,
}

/// Request body for `POST /admin/sections`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: SectionId,
    #[serde(flatten)]
    pub section: SectionInput,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check strength and hash, or pass `None` through.
fn hash_new_password(state: &AppState, password: Option<&str>) -> AppResult<Option<String>> {
    let Some(password) = password else {
        return Ok(None);
    };
    validate_password_strength(password, state.config.min_password_length)
        .map_err(AppError::BadRequest)?;
    hash_password(password)
        .map(Some)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

fn log_section_warnings(write: &SectionWrite) {
    for warning in &write.warnings {
        tracing::warn!(section_id = %write.section.id, warning = %warning, "Section configuration warning");
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let users = state.wiki.list_users(&auth.user_id).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = state.wiki.get_user(&auth.user_id, &id).await?;
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;
    let password_hash = hash_new_password(&state, input.password.as_deref())?;

    let user = state
        .wiki
        .create_user(
            &auth.user_id,
            &input.id,
            UserInput {
                name: input.name,
                groups: input.groups,
            },
            password_hash,
        )
        .await?;

    tracing::info!(user_id = %auth.user_id, created = %user.id, groups = ?user.groups, "User created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<User>>> {
    input.validate()?;
    let password_hash = hash_new_password(&state, input.password.as_deref())?;
    let password_changed = password_hash.is_some();

    let user = state
        .wiki
        .update_user(
            &auth.user_id,
            &id,
            UserInput {
                name: input.name,
                groups: input.groups,
            },
            password_hash,
        )
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        updated = %user.id,
        groups = ?user.groups,
        password_changed,
        "User updated"
    );
    Ok(Json(DataResponse { data: user }))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.wiki.delete_user(&auth.user_id, &id).await?;
    tracing::info!(user_id = %auth.user_id, deleted = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/groups
pub async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Group>>>> {
    let groups = state.wiki.list_groups(&auth.user_id).await?;
    Ok(Json(DataResponse { data: groups }))
}

/// POST /api/v1/admin/groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateGroupRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Group>>)> {
    input.validate()?;
    let group = state
        .wiki
        .create_group(&auth.user_id, &input.id, input.group)
        .await?;

    tracing::info!(user_id = %auth.user_id, group_id = %group.id, "Group created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: group })))
}

/// PUT /api/v1/admin/groups/{id}
pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<GroupInput>,
) -> AppResult<Json<DataResponse<Group>>> {
    let group = state.wiki.update_group(&auth.user_id, &id, input).await?;

    tracing::info!(user_id = %auth.user_id, group_id = %group.id, "Group updated");
    Ok(Json(DataResponse { data: group }))
}

/// DELETE /api/v1/admin/groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.wiki.delete_group(&auth.user_id, &id).await?;
    tracing::info!(user_id = %auth.user_id, group_id = %id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/sections
///
/// The response lists configuration warnings; nothing is auto-corrected.
pub async fn create_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateSectionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SectionWrite>>)> {
    input.validate()?;
    let write = state
        .wiki
        .create_section(&auth.user_id, &input.id, input.section)
        .await?;

    tracing::info!(user_id = %auth.user_id, section_id = %write.section.id, "Section created");
    log_section_warnings(&write);
    Ok((StatusCode::CREATED, Json(DataResponse { data: write })))
}

/// PUT /api/v1/admin/sections/{id}
///
/// Full replacement of title, group sets, and review policy.
pub async fn update_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<SectionInput>,
) -> AppResult<Json<DataResponse<SectionWrite>>> {
    let write = state.wiki.update_section(&auth.user_id, &id, input).await?;

    tracing::info!(user_id = %auth.user_id, section_id = %write.section.id, "Section updated");
    log_section_warnings(&write);
    Ok(Json(DataResponse { data: write }))
}

/// DELETE /api/v1/admin/sections/{id}
pub async fn delete_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.wiki.delete_section(&auth.user_id, &id).await?;
    tracing::info!(user_id = %auth.user_id, section_id = %id, "Section deleted");
    Ok(StatusCode::NO_CONTENT)
}
