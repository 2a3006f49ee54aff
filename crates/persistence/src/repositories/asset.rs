//! Asset repository for database operations.

use domain::models::NewAsset;
use sqlx::PgPool;

use crate::entities::AssetEntity;
use crate::metrics::QueryTimer;

/// Repository for asset-related database operations.
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    /// Creates a new AssetRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Assets newest first. Generated tiles are left out unless requested.
    pub async fn list(&self, include_tiles: bool) -> Result<Vec<AssetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_assets");
        let result = sqlx::query_as::<_, AssetEntity>(
            r#"
            SELECT a.id, a.asset_id, a.filename, a.display_name, a.asset_type, a.size, a.url, a.created_at
            FROM assets a
            WHERE $1 OR NOT EXISTS (SELECT 1 FROM split_assets sa WHERE sa.tile_asset_id = a.asset_id)
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(include_tiles)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_asset_id(
        &self,
        asset_id: &str,
    ) -> Result<Option<AssetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_asset_by_asset_id");
        let result = sqlx::query_as::<_, AssetEntity>(
            r#"
            SELECT id, asset_id, filename, display_name, asset_type, size, url, created_at
            FROM assets
            WHERE asset_id = $1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, asset: &NewAsset) -> Result<AssetEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_asset");
        let result = sqlx::query_as::<_, AssetEntity>(
            r#"
            INSERT INTO assets (asset_id, filename, display_name, asset_type, size, url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, asset_id, filename, display_name, asset_type, size, url, created_at
            "#,
        )
        .bind(&asset.asset_id)
        .bind(&asset.filename)
        .bind(&asset.display_name)
        .bind(asset.asset_type.as_str())
        .bind(asset.size)
        .bind(&asset.url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
