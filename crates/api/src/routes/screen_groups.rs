//! Screen group routes (admin): group metadata and membership.
//!
//! Membership changes and group deletion go through the group content
//! service; plain reads and metadata edits use the repository directly.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::playlist::ContentRemovalResponse;
use domain::models::screen_group::{
    AssignMemberRequest, CreateScreenGroupRequest, GroupMemberDetail, ListScreenGroupsResponse,
    ScreenGroupDetail, UpdateScreenGroupRequest,
};
use domain::models::{GroupMember, ScreenGroup, ScreenLayout};
use persistence::entities::GroupMemberDetailEntity;
use persistence::repositories::ScreenGroupRepository;
use serde::Serialize;
use shared::ids::prefixed_id;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::SuccessResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembersResponse {
    pub group_id: String,
    pub data: Vec<GroupMemberDetail>,
    pub count: usize,
}

fn group_not_found() -> ApiError {
    ApiError::NotFound("Group not found".to_string())
}

/// Buckets member rows by group, keeping their position order.
fn members_by_group(
    rows: Vec<GroupMemberDetailEntity>,
) -> HashMap<String, Vec<GroupMemberDetail>> {
    let mut grouped: HashMap<String, Vec<GroupMemberDetail>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.group_id.clone())
            .or_default()
            .push(row.into());
    }
    grouped
}

pub(crate) async fn load_group(
    repo: &ScreenGroupRepository,
    group_id: &str,
) -> Result<ScreenGroup, ApiError> {
    repo.find_by_group_id(group_id)
        .await?
        .map(Into::into)
        .ok_or_else(group_not_found)
}

/// GET /api/v1/admin/screen-groups
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<ListScreenGroupsResponse>, ApiError> {
    let repo = ScreenGroupRepository::new(state.pool.clone());
    let groups: Vec<ScreenGroup> = repo.list().await?.into_iter().map(Into::into).collect();

    let group_ids: Vec<String> = groups.iter().map(|g| g.group_id.clone()).collect();
    let mut members = members_by_group(repo.list_members(&group_ids).await?);

    let data: Vec<ScreenGroupDetail> = groups
        .into_iter()
        .map(|group| {
            let group_members = members.remove(&group.group_id).unwrap_or_default();
            ScreenGroupDetail::new(group, group_members)
        })
        .collect();
    let count = data.len();

    Ok(Json(ListScreenGroupsResponse { data, count }))
}

/// GET /api/v1/admin/screen-groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<ScreenGroupDetail>, ApiError> {
    let repo = ScreenGroupRepository::new(state.pool.clone());
    let group = load_group(&repo, &group_id).await?;
    let members = repo
        .list_members(&[group_id])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ScreenGroupDetail::new(group, members)))
}

/// Create a group. The layout is fixed for the group's lifetime.
///
/// POST /api/v1/admin/screen-groups
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateScreenGroupRequest>,
) -> Result<(StatusCode, Json<ScreenGroupDetail>), ApiError> {
    request.validate()?;
    let layout: ScreenLayout = request.layout.parse()?;

    let repo = ScreenGroupRepository::new(state.pool.clone());
    let group: ScreenGroup = repo
        .create(
            &prefixed_id("group"),
            request.name.trim(),
            layout.as_str(),
            request.description.as_deref(),
        )
        .await?
        .into();

    info!(
        group_id = %group.group_id,
        layout = %layout,
        "Screen group created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ScreenGroupDetail::new(group, Vec::new())),
    ))
}

/// PUT /api/v1/admin/screen-groups/:group_id
pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<UpdateScreenGroupRequest>,
) -> Result<Json<ScreenGroup>, ApiError> {
    request.validate()?;

    let repo = ScreenGroupRepository::new(state.pool.clone());
    let group = repo
        .update(
            &group_id,
            request.name.trim(),
            request.description.as_deref(),
        )
        .await?
        .ok_or_else(group_not_found)?;

    info!(group_id = %group_id, "Screen group updated");
    Ok(Json(group.into()))
}

/// Retract all group content, then delete the group and its memberships.
///
/// DELETE /api/v1/admin/screen-groups/:group_id
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<ContentRemovalResponse>, ApiError> {
    let removal = state.content.delete_group(&group_id).await?;
    Ok(Json(removal))
}

/// GET /api/v1/admin/screen-groups/:group_id/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let repo = ScreenGroupRepository::new(state.pool.clone());
    load_group(&repo, &group_id).await?;

    let data: Vec<GroupMemberDetail> = repo
        .list_members(&[group_id.clone()])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(ListMembersResponse {
        group_id,
        data,
        count,
    }))
}

/// Place a screen at a layout position.
///
/// POST /api/v1/admin/screen-groups/:group_id/members
pub async fn assign_member(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<AssignMemberRequest>,
) -> Result<(StatusCode, Json<GroupMember>), ApiError> {
    request.validate()?;

    let member = state
        .content
        .assign_member(&group_id, &request.screen_id, request.position)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove a screen from a group. Its playlist rows stay; unassigning a
/// screen that is not a member succeeds.
///
/// DELETE /api/v1/admin/screen-groups/:group_id/members/:screen_id
pub async fn unassign_member(
    State(state): State<AppState>,
    Path((group_id, screen_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.content.unassign_member(&group_id, &screen_id).await?;
    Ok(Json(SuccessResponse::ok()))
}
