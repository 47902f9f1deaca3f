//! Handlers for the `/auth` resource (login, current identity).

use axum::extract::State;
use axum::Json;
use quire_core::error::CoreError;
use quire_core::store::DirectoryStore;
use quire_core::types::{GroupSet, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public view of the caller. Groups are read at request time.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub groups: GroupSet,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid user id or password".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Users without a password hash cannot log in.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    input.validate()?;

    let user = state
        .wiki
        .store()
        .find_user(&input.user_id)
        .await?
        .ok_or_else(invalid_credentials)?;
    let hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&input.password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid_credentials());
    }

    let access_token = generate_access_token(&user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(DataResponse {
        data: AuthResponse {
            access_token,
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
            user: UserInfo {
                id: user.id,
                name: user.name,
                groups: user.groups,
            },
        },
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserInfo>>> {
    let user = state
        .wiki
        .store()
        .find_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    Ok(Json(DataResponse {
        data: UserInfo {
            id: user.id,
            name: user.name,
            groups: user.groups,
        },
    }))
}
