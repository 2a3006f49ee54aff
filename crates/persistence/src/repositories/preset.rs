//! Preset playlist repository for database operations.
//!
//! Appends and moves share the advisory lock scheme of the other playlists.
//! Applying a preset rewrites one screen playlist per transaction.

use sqlx::PgPool;

use crate::entities::{PresetEntity, PresetItemDetailEntity, PresetItemEntity};
use crate::metrics::QueryTimer;
use crate::repositories::content_store::{self, PlaylistTable};

/// Repository for preset playlist database operations.
#[derive(Clone)]
pub struct PresetRepository {
    pool: PgPool,
}

impl PresetRepository {
    /// Creates a new PresetRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self) -> Result<Vec<PresetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_presets");
        let result = sqlx::query_as::<_, PresetEntity>(
            r#"
            SELECT id, preset_id, name, description, created_at, updated_at
            FROM preset_playlists
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_preset_id(
        &self,
        preset_id: &str,
    ) -> Result<Option<PresetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_preset");
        let result = sqlx::query_as::<_, PresetEntity>(
            r#"
            SELECT id, preset_id, name, description, created_at, updated_at
            FROM preset_playlists
            WHERE preset_id = $1
            "#,
        )
        .bind(preset_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        preset_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<PresetEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_preset");
        let result = sqlx::query_as::<_, PresetEntity>(
            r#"
            INSERT INTO preset_playlists (preset_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, preset_id, name, description, created_at, updated_at
            "#,
        )
        .bind(preset_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a preset and its items. Screens it was applied to keep their rows.
    pub async fn delete(&self, preset_id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_preset");
        let result = sqlx::query("DELETE FROM preset_playlists WHERE preset_id = $1")
            .bind(preset_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Items of the given presets joined with their assets, in play order.
    pub async fn list_items(
        &self,
        preset_ids: &[String],
    ) -> Result<Vec<PresetItemDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_preset_items");
        let result = sqlx::query_as::<_, PresetItemDetailEntity>(
            r#"
            SELECT p.id, p.preset_id, p.asset_id, p.duration, p.position, p.created_at,
                   a.filename, a.asset_type, a.url, a.size
            FROM preset_playlist_items p
            JOIN assets a ON a.asset_id = p.asset_id
            WHERE p.preset_id = ANY($1)
            ORDER BY p.preset_id, p.position
            "#,
        )
        .bind(preset_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Appends an asset at the end of the preset.
    pub async fn append_item(
        &self,
        preset_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<PresetItemEntity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        content_store::lock_owner(&mut tx, PlaylistTable::Preset, preset_id).await?;

        let timer = QueryTimer::new("append_preset_item");
        let item = sqlx::query_as::<_, PresetItemEntity>(
            r#"
            INSERT INTO preset_playlist_items (preset_id, asset_id, duration, position)
            SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1
            FROM preset_playlist_items
            WHERE preset_id = $1
            RETURNING id, preset_id, asset_id, duration, position, created_at
            "#,
        )
        .bind(preset_id)
        .bind(asset_id)
        .bind(duration)
        .fetch_one(&mut *tx)
        .await;
        timer.record();

        let item = item?;
        tx.commit().await?;
        Ok(item)
    }

    /// Edits one item. A new position moves the item and shifts its
    /// neighbours, all in one transaction.
    pub async fn update_item(
        &self,
        preset_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<Option<PresetItemEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        if let Some(position) = position {
            if !content_store::move_preset_playlist_item(&mut tx, preset_id, item_id, position)
                .await?
            {
                return Ok(None);
            }
        }

        let timer = QueryTimer::new("update_preset_item");
        let item = sqlx::query_as::<_, PresetItemEntity>(
            r#"
            UPDATE preset_playlist_items
            SET duration = COALESCE($3, duration)
            WHERE preset_id = $1 AND id = $2
            RETURNING id, preset_id, asset_id, duration, position, created_at
            "#,
        )
        .bind(preset_id)
        .bind(item_id)
        .bind(duration)
        .fetch_optional(&mut *tx)
        .await;
        timer.record();

        let item = item?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn delete_item(&self, preset_id: &str, item_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_preset_item");
        let result =
            sqlx::query("DELETE FROM preset_playlist_items WHERE preset_id = $1 AND id = $2")
                .bind(preset_id)
                .bind(item_id)
                .execute(&self.pool)
                .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Replaces a screen's playlist with `items`, in their order.
    ///
    /// Runs in one transaction under the screen's playlist lock, so the
    /// screen never shows a half-applied preset and concurrent appends land
    /// after the preset rows.
    pub async fn apply_to_screen(
        &self,
        screen_id: &str,
        items: &[PresetItemEntity],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        content_store::lock_owner(&mut tx, PlaylistTable::Screen, screen_id).await?;

        let timer = QueryTimer::new("clear_screen_playlist");
        let cleared = sqlx::query("DELETE FROM playlists WHERE screen_id = $1")
            .bind(screen_id)
            .execute(&mut *tx)
            .await;
        timer.record();
        cleared?;

        let mut written = 0;
        for item in items {
            content_store::append_screen_playlist_item(
                &mut tx,
                screen_id,
                &item.asset_id,
                item.duration,
            )
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }
}
