//! Playlist entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::playlist::{GroupPlaylistItemDetail, PlaylistItemDetail};
use domain::models::{AssetType, GroupPlaylistItem, PlaylistItem, SplitTile};
use sqlx::FromRow;

/// Database row mapping for the playlists table.
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistItemEntity {
    pub id: i64,
    pub screen_id: String,
    pub asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PlaylistItemEntity> for PlaylistItem {
    fn from(entity: PlaylistItemEntity) -> Self {
        Self {
            id: entity.id,
            screen_id: entity.screen_id,
            asset_id: entity.asset_id,
            duration: entity.duration,
            position: entity.position,
            created_at: entity.created_at,
        }
    }
}

/// Screen playlist row joined with its asset.
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistItemDetailEntity {
    #[sqlx(flatten)]
    pub item: PlaylistItemEntity,
    pub filename: String,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

impl From<PlaylistItemDetailEntity> for PlaylistItemDetail {
    fn from(entity: PlaylistItemDetailEntity) -> Self {
        Self {
            item: entity.item.into(),
            filename: entity.filename,
            asset_type: entity.asset_type,
            url: entity.url,
            size: entity.size,
        }
    }
}

/// Database row mapping for the group_playlists table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupPlaylistItemEntity {
    pub id: i64,
    pub group_id: String,
    pub original_asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<GroupPlaylistItemEntity> for GroupPlaylistItem {
    fn from(entity: GroupPlaylistItemEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            original_asset_id: entity.original_asset_id,
            duration: entity.duration,
            position: entity.position,
            created_at: entity.created_at,
        }
    }
}

/// Group playlist row joined with its original asset.
#[derive(Debug, Clone, FromRow)]
pub struct GroupPlaylistItemDetailEntity {
    #[sqlx(flatten)]
    pub item: GroupPlaylistItemEntity,
    pub filename: String,
    pub display_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

impl From<GroupPlaylistItemDetailEntity> for GroupPlaylistItemDetail {
    fn from(entity: GroupPlaylistItemDetailEntity) -> Self {
        Self {
            item: entity.item.into(),
            filename: entity.filename,
            display_name: entity.display_name,
            asset_type: entity.asset_type,
            url: entity.url,
            size: entity.size,
        }
    }
}

/// Split linkage row left-joined with the tile's asset.
#[derive(Debug, Clone, FromRow)]
pub struct SplitTileEntity {
    pub tile_asset_id: String,
    pub position: i32,
    pub url: Option<String>,
}

impl From<SplitTileEntity> for SplitTile {
    fn from(entity: SplitTileEntity) -> Self {
        Self {
            tile_asset_id: entity.tile_asset_id,
            position: entity.position,
            url: entity.url,
        }
    }
}
