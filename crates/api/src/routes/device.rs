//! Device-facing routes. Each screen authenticates with its own API key and
//! may only read or report on itself.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use domain::models::heartbeat::{HeartbeatAck, HeartbeatRequest};
use domain::models::playlist::{DevicePlaylist, DevicePlaylistItem, PlaylistItemDetail};
use domain::models::screen::ScreenConfig;
use domain::models::{Asset, Heartbeat, Screen};
use persistence::repositories::{
    AssetRepository, HeartbeatRepository, PlaylistRepository, ScreenRepository,
};
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ScreenAuth;
use crate::middleware::metrics::record_heartbeat;

/// GET /api/v1/screens/:screen_id/config
pub async fn get_config(
    State(state): State<AppState>,
    auth: ScreenAuth,
    Path(screen_id): Path<String>,
) -> Result<Json<ScreenConfig>, ApiError> {
    auth.authorize(&screen_id)?;

    let screen: Screen = ScreenRepository::new(state.pool.clone())
        .find_by_screen_id(&screen_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Screen not found".to_string()))?
        .into();

    Ok(Json(screen.into()))
}

/// GET /api/v1/screens/:screen_id/playlist
pub async fn get_playlist(
    State(state): State<AppState>,
    auth: ScreenAuth,
    Path(screen_id): Path<String>,
) -> Result<Json<DevicePlaylist>, ApiError> {
    auth.authorize(&screen_id)?;

    let repo = PlaylistRepository::new(state.pool.clone());
    let items: Vec<DevicePlaylistItem> = repo
        .list_for_screen(&screen_id)
        .await?
        .into_iter()
        .map(|row| DevicePlaylistItem::from(PlaylistItemDetail::from(row)))
        .collect();
    let last_updated = repo.last_updated(&screen_id).await?;

    Ok(Json(DevicePlaylist {
        screen_id,
        last_updated,
        items,
    }))
}

/// POST /api/v1/screens/:screen_id/heartbeat
pub async fn post_heartbeat(
    State(state): State<AppState>,
    auth: ScreenAuth,
    Path(screen_id): Path<String>,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatAck>, ApiError> {
    auth.authorize(&screen_id)?;
    request.validate()?;

    let status = request.status_or_default();
    HeartbeatRepository::new(state.pool.clone())
        .record(
            &screen_id,
            status,
            request.current_asset.as_deref(),
            request.uptime,
            request.temperature,
        )
        .await?;

    record_heartbeat(status);
    debug!(screen_id = %screen_id, status = %status, "Heartbeat recorded");

    Ok(Json(HeartbeatAck {
        success: true,
        message: "Heartbeat received".to_string(),
    }))
}

/// GET /api/v1/screens/:screen_id/heartbeat
pub async fn get_heartbeat(
    State(state): State<AppState>,
    auth: ScreenAuth,
    Path(screen_id): Path<String>,
) -> Result<Json<Heartbeat>, ApiError> {
    auth.authorize(&screen_id)?;

    let heartbeat = HeartbeatRepository::new(state.pool.clone())
        .latest(&screen_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No heartbeat recorded".to_string()))?;

    Ok(Json(heartbeat.into()))
}

async fn find_asset(state: &AppState, asset_id: &str) -> Result<Asset, ApiError> {
    AssetRepository::new(state.pool.clone())
        .find_by_asset_id(asset_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Asset not found".to_string()))
}

/// GET /api/v1/assets/:asset_id
pub async fn get_asset(
    State(state): State<AppState>,
    _auth: ScreenAuth,
    Path(asset_id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    Ok(Json(find_asset(&state, &asset_id).await?))
}

/// Redirects to the asset's blob URL.
///
/// GET /api/v1/assets/:asset_id/download
pub async fn download_asset(
    State(state): State<AppState>,
    _auth: ScreenAuth,
    Path(asset_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let asset = find_asset(&state, &asset_id).await?;
    Ok(Redirect::temporary(&asset.url))
}
