//! Group content routes (admin).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::playlist::{
    AssignContentRequest, ContentAssetQuery, ContentAssignmentResponse, ContentRemovalResponse,
    GroupPlaylistItemDetail, UpdateContentRequest, UpdateDurationRequest,
};
use domain::models::GroupPlaylistItem;
use persistence::repositories::ScreenGroupRepository;
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::screen_groups::load_group;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContentResponse {
    pub group_id: String,
    pub data: Vec<GroupPlaylistItemDetail>,
    pub count: usize,
}

/// The group playlist in play order.
///
/// GET /api/v1/admin/screen-groups/:group_id/content
pub async fn list_content(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupContentResponse>, ApiError> {
    let repo = ScreenGroupRepository::new(state.pool.clone());
    load_group(&repo, &group_id).await?;

    let data: Vec<GroupPlaylistItemDetail> = repo
        .list_content(&group_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(GroupContentResponse {
        group_id,
        data,
        count,
    }))
}

/// Assign an asset to every screen of a complete group. Images are split
/// into one tile per position; videos play whole on every screen.
///
/// POST /api/v1/admin/screen-groups/:group_id/content
pub async fn assign_content(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<AssignContentRequest>,
) -> Result<(StatusCode, Json<ContentAssignmentResponse>), ApiError> {
    request.validate()?;

    let duration = request
        .duration
        .unwrap_or(state.config.content.default_duration_secs);
    let assignment = state
        .content
        .assign_content(&group_id, request.asset_id.trim(), duration)
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Edit duration and/or position of a group entry. A duration change
/// reaches every screen row derived from the entry.
///
/// PUT /api/v1/admin/screen-groups/:group_id/content/:item_id
pub async fn update_content(
    State(state): State<AppState>,
    Path((group_id, item_id)): Path<(String, i64)>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<GroupPlaylistItem>, ApiError> {
    request.validate()?;

    let item = state
        .content
        .update_content(&group_id, item_id, request.duration, request.position)
        .await?;

    Ok(Json(item))
}

fn required_asset_id(query: &ContentAssetQuery) -> Result<&str, ApiError> {
    query
        .asset_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("assetId query parameter is required".to_string()))
}

/// Set the duration of the group entry for an original asset, on the group
/// playlist and every derived screen row.
///
/// PUT /api/v1/admin/screen-groups/:group_id/content?assetId=
pub async fn update_content_duration(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<ContentAssetQuery>,
    Json(request): Json<UpdateDurationRequest>,
) -> Result<Json<GroupPlaylistItem>, ApiError> {
    let asset_id = required_asset_id(&query)?;
    request.validate()?;

    let item = state
        .content
        .update_duration(&group_id, asset_id, request.duration)
        .await?;

    Ok(Json(item))
}

/// Retract an asset from a group. Safe to repeat.
///
/// DELETE /api/v1/admin/screen-groups/:group_id/content?assetId=
pub async fn remove_content(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<ContentAssetQuery>,
) -> Result<Json<ContentRemovalResponse>, ApiError> {
    let asset_id = required_asset_id(&query)?;

    let removal = state.content.remove_content(&group_id, asset_id).await?;
    Ok(Json(removal))
}
