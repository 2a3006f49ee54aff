//! Playlist domain models: per-screen playlists, group playlists and the
//! tile linkage between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_not_blank;
use validator::Validate;

use super::asset::AssetType;

/// Upper bound accepted for any playlist duration, in seconds.
pub const MAX_DURATION_SECS: i32 = 86_400;

/// One entry of a screen's own playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub id: i64,
    pub screen_id: String,
    pub asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Screen playlist entry joined with its asset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemDetail {
    #[serde(flatten)]
    pub item: PlaylistItem,
    pub filename: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

/// One logical entry of a group's playlist, referencing the original asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlaylistItem {
    pub id: i64,
    pub group_id: String,
    pub original_asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Group playlist entry joined with its original asset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlaylistItemDetail {
    #[serde(flatten)]
    pub item: GroupPlaylistItem,
    pub filename: String,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

/// Linkage from a generated tile back to its original and group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAsset {
    pub original_asset_id: String,
    pub tile_asset_id: String,
    pub group_id: String,
    pub position: i32,
}

/// A tile found through its linkage row. `url` is absent when the tile's
/// asset row is already gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitTile {
    pub tile_asset_id: String,
    pub position: i32,
    pub url: Option<String>,
}

/// Request payload for assigning content to a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignContentRequest {
    #[validate(length(min = 1, max = 100, message = "Asset ID required"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub asset_id: String,

    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 and 86400 seconds"))]
    pub duration: Option<i32>,
}

/// Request payload for editing a group content entry.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateContentRequest {
    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 and 86400 seconds"))]
    pub duration: Option<i32>,

    #[validate(range(min = 1, message = "Positions start at 1"))]
    pub position: Option<i32>,
}

impl UpdateContentRequest {
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.position.is_none()
    }
}

/// Query parameters identifying group content by its original asset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAssetQuery {
    pub asset_id: Option<String>,
}

/// Request payload for setting the duration of group content by asset.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDurationRequest {
    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 and 86400 seconds"))]
    pub duration: i32,
}

/// Request payload for appending to a screen playlist.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddPlaylistItemRequest {
    #[validate(length(min = 1, max = 100, message = "Asset ID required"))]
    pub asset_id: String,

    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 and 86400 seconds"))]
    pub duration: Option<i32>,
}

/// Result of a group content assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAssignmentResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<usize>,
    pub item: GroupPlaylistItem,
}

/// Result of a group content removal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRemovalResponse {
    pub success: bool,
    pub tiles_removed: usize,
    pub blob_failures: usize,
}

/// One entry of the playlist served to a device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePlaylistItem {
    pub asset_id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub url: String,
    pub duration: i32,
    pub position: i32,
}

/// Playlist served to a device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePlaylist {
    pub screen_id: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub items: Vec<DevicePlaylistItem>,
}

impl From<PlaylistItemDetail> for DevicePlaylistItem {
    fn from(detail: PlaylistItemDetail) -> Self {
        Self {
            asset_id: detail.item.asset_id,
            asset_type: detail.asset_type,
            url: detail.url,
            duration: detail.item.duration,
            position: detail.item.position,
        }
    }
}
