//! Asset entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::AssetType;
use sqlx::FromRow;

/// Database row mapping for the assets table.
#[derive(Debug, Clone, FromRow)]
pub struct AssetEntity {
    pub id: i64,
    pub asset_id: String,
    pub filename: String,
    pub display_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub size: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<AssetEntity> for domain::models::Asset {
    fn from(entity: AssetEntity) -> Self {
        Self {
            id: entity.id,
            asset_id: entity.asset_id,
            filename: entity.filename,
            display_name: entity.display_name,
            asset_type: entity.asset_type,
            size: entity.size,
            url: entity.url,
            created_at: entity.created_at,
        }
    }
}
