//! Handlers for the read-only `/sections` resource.

use axum::extract::{Path, State};
use axum::Json;
use quire_core::section::Section;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sections
pub async fn list_sections(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Section>>>> {
    let sections = state.wiki.list_sections(&auth.user_id).await?;
    Ok(Json(DataResponse { data: sections }))
}

/// GET /api/v1/sections/{id}
pub async fn get_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Section>>> {
    let section = state.wiki.get_section(&auth.user_id, &id).await?;
    Ok(Json(DataResponse { data: section }))
}
