//! Screen playlist routes (admin). Edits are local to one screen.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::playlist::{AddPlaylistItemRequest, PlaylistItemDetail, UpdateContentRequest};
use domain::models::PlaylistItem;
use persistence::repositories::{AssetRepository, PlaylistRepository, ScreenRepository};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::SuccessResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPlaylistResponse {
    pub screen_id: String,
    pub data: Vec<PlaylistItemDetail>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearPlaylistResponse {
    pub success: bool,
    pub removed: u64,
}

async fn ensure_screen(state: &AppState, screen_id: &str) -> Result<(), ApiError> {
    ScreenRepository::new(state.pool.clone())
        .find_by_screen_id(screen_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Screen not found".to_string()))
}

/// GET /api/v1/admin/screens/:screen_id/playlist
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<ScreenPlaylistResponse>, ApiError> {
    ensure_screen(&state, &screen_id).await?;

    let repo = PlaylistRepository::new(state.pool.clone());
    let data: Vec<PlaylistItemDetail> = repo
        .list_for_screen(&screen_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(ScreenPlaylistResponse {
        screen_id,
        data,
        count,
    }))
}

/// Append an asset to the end of a screen's playlist.
///
/// POST /api/v1/admin/screens/:screen_id/playlist
pub async fn add_item(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
    Json(request): Json<AddPlaylistItemRequest>,
) -> Result<(StatusCode, Json<PlaylistItem>), ApiError> {
    request.validate()?;
    ensure_screen(&state, &screen_id).await?;

    AssetRepository::new(state.pool.clone())
        .find_by_asset_id(&request.asset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Asset not found".to_string()))?;

    let duration = request
        .duration
        .unwrap_or(state.config.content.default_duration_secs);
    let item = PlaylistRepository::new(state.pool.clone())
        .append(&screen_id, &request.asset_id, duration)
        .await?;

    info!(
        screen_id = %screen_id,
        asset_id = %item.asset_id,
        position = item.position,
        "Playlist item added"
    );
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /api/v1/admin/screens/:screen_id/playlist/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    Path((screen_id, item_id)): Path<(String, i64)>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<PlaylistItem>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation(
            "Nothing to update: provide duration or position".to_string(),
        ));
    }

    let item = PlaylistRepository::new(state.pool.clone())
        .update_item(&screen_id, item_id, request.duration, request.position)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("Playlist position already in use".to_string())
            }
            other => other,
        })?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

    Ok(Json(item.into()))
}

/// DELETE /api/v1/admin/screens/:screen_id/playlist/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Path((screen_id, item_id)): Path<(String, i64)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let removed = PlaylistRepository::new(state.pool.clone())
        .delete_item(&screen_id, item_id)
        .await?;

    if removed > 0 {
        info!(screen_id = %screen_id, item_id, "Playlist item removed");
    }
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/v1/admin/screens/:screen_id/playlist/clear
pub async fn clear_playlist(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<ClearPlaylistResponse>, ApiError> {
    let removed = PlaylistRepository::new(state.pool.clone())
        .clear(&screen_id)
        .await?;

    info!(screen_id = %screen_id, removed, "Playlist cleared");
    Ok(Json(ClearPlaylistResponse {
        success: true,
        removed,
    }))
}
