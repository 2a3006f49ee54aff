//! Screen group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_identifier, validate_not_blank};
use validator::Validate;

use super::layout::ScreenLayout;

/// A set of screen positions arranged under one layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGroup {
    pub id: i64,
    pub group_id: String,
    pub name: String,
    pub layout: ScreenLayout,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment of one screen to one position of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: i64,
    pub group_id: String,
    pub screen_id: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Member row joined with the screen it refers to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberDetail {
    pub screen_id: String,
    pub position: i32,
    pub name: String,
    pub location: Option<String>,
    pub resolution: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Group with its members, as shown to operators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGroupDetail {
    #[serde(flatten)]
    pub group: ScreenGroup,
    pub position_count: i32,
    pub is_complete: bool,
    pub members: Vec<GroupMemberDetail>,
}

impl ScreenGroupDetail {
    pub fn new(group: ScreenGroup, members: Vec<GroupMemberDetail>) -> Self {
        let position_count = group.layout.position_count();
        Self {
            is_complete: is_complete(group.layout, members.len()),
            position_count,
            group,
            members,
        }
    }
}

/// A group is complete when every layout position holds exactly one screen.
///
/// Position and screen uniqueness are enforced by storage, so a member count
/// equal to the position count means every position is filled.
pub fn is_complete(layout: ScreenLayout, member_count: usize) -> bool {
    member_count == layout.position_count() as usize
}

/// Request payload for creating a screen group.
///
/// `layout` stays a plain string so an unknown value surfaces as an
/// invalid-layout error rather than a body decoding failure.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateScreenGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    pub layout: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Request payload for updating a screen group. The layout is immutable.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateScreenGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Request payload for placing a screen at a group position.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignMemberRequest {
    #[validate(length(min = 1, max = 50, message = "Screen ID must be between 1 and 50 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub screen_id: String,

    pub position: i32,
}

/// Response for group listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListScreenGroupsResponse {
    pub data: Vec<ScreenGroupDetail>,
    pub count: usize,
}
