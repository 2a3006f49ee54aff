//! Preset playlist routes (admin).
//!
//! Presets are templates: editing one never touches a screen. Applying one
//! replaces the playlist of each listed screen with a copy of its items.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::playlist::{AddPlaylistItemRequest, UpdateContentRequest};
use domain::models::preset::{
    ApplyPresetRequest, ApplyPresetResponse, CreatePresetRequest, ListPresetsResponse,
    PresetDetail, PresetItemDetail,
};
use domain::models::{Preset, PresetItem};
use persistence::entities::PresetItemDetailEntity;
use persistence::repositories::{AssetRepository, PresetRepository, ScreenRepository};
use serde::Serialize;
use shared::ids::prefixed_id;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_preset_applied;
use crate::routes::SuccessResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetItemsResponse {
    pub preset_id: String,
    pub data: Vec<PresetItemDetail>,
    pub count: usize,
}

fn preset_not_found() -> ApiError {
    ApiError::NotFound("Preset not found".to_string())
}

async fn load_preset(repo: &PresetRepository, preset_id: &str) -> Result<Preset, ApiError> {
    repo.find_by_preset_id(preset_id)
        .await?
        .map(Into::into)
        .ok_or_else(preset_not_found)
}

fn items_by_preset(rows: Vec<PresetItemDetailEntity>) -> HashMap<String, Vec<PresetItemDetail>> {
    let mut grouped: HashMap<String, Vec<PresetItemDetail>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.item.preset_id.clone())
            .or_default()
            .push(row.into());
    }
    grouped
}

/// GET /api/v1/admin/presets
pub async fn list_presets(
    State(state): State<AppState>,
) -> Result<Json<ListPresetsResponse>, ApiError> {
    let repo = PresetRepository::new(state.pool.clone());
    let presets: Vec<Preset> = repo.list().await?.into_iter().map(Into::into).collect();

    let preset_ids: Vec<String> = presets.iter().map(|p| p.preset_id.clone()).collect();
    let mut items = items_by_preset(repo.list_items(&preset_ids).await?);

    let data: Vec<PresetDetail> = presets
        .into_iter()
        .map(|preset| {
            let preset_items = items.remove(&preset.preset_id).unwrap_or_default();
            PresetDetail::new(preset, preset_items)
        })
        .collect();
    let count = data.len();

    Ok(Json(ListPresetsResponse { data, count }))
}

/// GET /api/v1/admin/presets/:preset_id
pub async fn get_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
) -> Result<Json<PresetDetail>, ApiError> {
    let repo = PresetRepository::new(state.pool.clone());
    let preset = load_preset(&repo, &preset_id).await?;
    let items = repo
        .list_items(&[preset_id])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(PresetDetail::new(preset, items)))
}

/// POST /api/v1/admin/presets
pub async fn create_preset(
    State(state): State<AppState>,
    Json(request): Json<CreatePresetRequest>,
) -> Result<(StatusCode, Json<PresetDetail>), ApiError> {
    request.validate()?;

    let preset: Preset = PresetRepository::new(state.pool.clone())
        .create(
            &prefixed_id("preset"),
            request.name.trim(),
            request.description.as_deref(),
        )
        .await?
        .into();

    info!(preset_id = %preset.preset_id, "Preset created");
    Ok((
        StatusCode::CREATED,
        Json(PresetDetail::new(preset, Vec::new())),
    ))
}

/// Deleting a preset leaves the screens it was applied to untouched.
///
/// DELETE /api/v1/admin/presets/:preset_id
pub async fn delete_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let removed = PresetRepository::new(state.pool.clone())
        .delete(&preset_id)
        .await?;

    if removed > 0 {
        info!(preset_id = %preset_id, "Preset deleted");
    }
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/v1/admin/presets/:preset_id/items
pub async fn list_items(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
) -> Result<Json<PresetItemsResponse>, ApiError> {
    let repo = PresetRepository::new(state.pool.clone());
    load_preset(&repo, &preset_id).await?;

    let data: Vec<PresetItemDetail> = repo
        .list_items(&[preset_id.clone()])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(PresetItemsResponse {
        preset_id,
        data,
        count,
    }))
}

/// POST /api/v1/admin/presets/:preset_id/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
    Json(request): Json<AddPlaylistItemRequest>,
) -> Result<(StatusCode, Json<PresetItem>), ApiError> {
    request.validate()?;
    let repo = PresetRepository::new(state.pool.clone());
    load_preset(&repo, &preset_id).await?;

    AssetRepository::new(state.pool.clone())
        .find_by_asset_id(&request.asset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Asset not found".to_string()))?;

    let duration = request
        .duration
        .unwrap_or(state.config.content.default_duration_secs);
    let item = repo
        .append_item(&preset_id, &request.asset_id, duration)
        .await?;

    info!(
        preset_id = %preset_id,
        asset_id = %item.asset_id,
        position = item.position,
        "Preset item added"
    );
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /api/v1/admin/presets/:preset_id/items/:item_id
pub async fn update_item(
    State(state): State<AppState>,
    Path((preset_id, item_id)): Path<(String, i64)>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<PresetItem>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation(
            "Nothing to update: provide duration or position".to_string(),
        ));
    }

    let item = PresetRepository::new(state.pool.clone())
        .update_item(&preset_id, item_id, request.duration, request.position)
        .await?
        .ok_or_else(|| ApiError::NotFound("Preset item not found".to_string()))?;

    Ok(Json(item.into()))
}

/// DELETE /api/v1/admin/presets/:preset_id/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Path((preset_id, item_id)): Path<(String, i64)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let removed = PresetRepository::new(state.pool.clone())
        .delete_item(&preset_id, item_id)
        .await?;

    if removed > 0 {
        info!(preset_id = %preset_id, item_id, "Preset item removed");
    }
    Ok(Json(SuccessResponse::ok()))
}

/// Replace each listed screen's playlist with the preset's items.
///
/// Every screen is checked before any playlist is touched; each screen is
/// then rewritten in its own transaction.
///
/// POST /api/v1/admin/presets/:preset_id/apply
pub async fn apply_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
    Json(request): Json<ApplyPresetRequest>,
) -> Result<Json<ApplyPresetResponse>, ApiError> {
    request.validate()?;
    let repo = PresetRepository::new(state.pool.clone());
    load_preset(&repo, &preset_id).await?;

    let screens = ScreenRepository::new(state.pool.clone());
    for screen_id in &request.screen_ids {
        if screens.find_by_screen_id(screen_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("Screen not found: {}", screen_id)));
        }
    }

    let items: Vec<_> = repo
        .list_items(&[preset_id.clone()])
        .await?
        .into_iter()
        .map(|row| row.item)
        .collect();

    for screen_id in &request.screen_ids {
        repo.apply_to_screen(screen_id, &items).await?;
    }
    record_preset_applied(request.screen_ids.len());

    info!(
        preset_id = %preset_id,
        screens = request.screen_ids.len(),
        items = items.len(),
        "Preset applied"
    );
    Ok(Json(ApplyPresetResponse::new(
        request.screen_ids.len(),
        items.len(),
    )))
}
