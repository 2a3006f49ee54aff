//! Preset playlist entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::preset::PresetItemDetail;
use domain::models::{AssetType, Preset, PresetItem};
use sqlx::FromRow;

/// Database row mapping for the preset_playlists table.
#[derive(Debug, Clone, FromRow)]
pub struct PresetEntity {
    pub id: i64,
    pub preset_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PresetEntity> for Preset {
    fn from(entity: PresetEntity) -> Self {
        Self {
            id: entity.id,
            preset_id: entity.preset_id,
            name: entity.name,
            description: entity.description,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the preset_playlist_items table.
#[derive(Debug, Clone, FromRow)]
pub struct PresetItemEntity {
    pub id: i64,
    pub preset_id: String,
    pub asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PresetItemEntity> for PresetItem {
    fn from(entity: PresetItemEntity) -> Self {
        Self {
            id: entity.id,
            preset_id: entity.preset_id,
            asset_id: entity.asset_id,
            duration: entity.duration,
            position: entity.position,
            created_at: entity.created_at,
        }
    }
}

/// Preset row joined with its asset.
#[derive(Debug, Clone, FromRow)]
pub struct PresetItemDetailEntity {
    #[sqlx(flatten)]
    pub item: PresetItemEntity,
    pub filename: String,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

impl From<PresetItemDetailEntity> for PresetItemDetail {
    fn from(entity: PresetItemDetailEntity) -> Self {
        Self {
            item: entity.item.into(),
            filename: entity.filename,
            asset_type: entity.asset_type,
            url: entity.url,
            size: entity.size,
        }
    }
}
