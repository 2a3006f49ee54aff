//! Screen playlist repository for database operations.
//!
//! Edits here are local to one screen's playlist. Group-derived rows are
//! managed by the group content service.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{PlaylistItemDetailEntity, PlaylistItemEntity};
use crate::metrics::QueryTimer;
use crate::repositories::content_store;

/// Repository for screen playlist database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    /// Creates a new PlaylistRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A screen's playlist in play order, joined with asset details.
    pub async fn list_for_screen(
        &self,
        screen_id: &str,
    ) -> Result<Vec<PlaylistItemDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_screen_playlist");
        let result = sqlx::query_as::<_, PlaylistItemDetailEntity>(
            r#"
            SELECT p.id, p.screen_id, p.asset_id, p.duration, p.position, p.created_at,
                   a.filename, a.asset_type, a.url, a.size
            FROM playlists p
            JOIN assets a ON a.asset_id = p.asset_id
            WHERE p.screen_id = $1
            ORDER BY p.position
            "#,
        )
        .bind(screen_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// When the screen's playlist last gained a row.
    pub async fn last_updated(&self, screen_id: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let timer = QueryTimer::new("screen_playlist_last_updated");
        let result = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(created_at) FROM playlists WHERE screen_id = $1",
        )
        .bind(screen_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Append an asset at the end of the screen's playlist.
    pub async fn append(
        &self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<PlaylistItemEntity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let item =
            content_store::append_screen_playlist_item(&mut tx, screen_id, asset_id, duration)
                .await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Edits one row. A new position moves the row and shifts its
    /// neighbours, all in one transaction.
    pub async fn update_item(
        &self,
        screen_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<Option<PlaylistItemEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        if let Some(position) = position {
            if !content_store::move_screen_playlist_item(&mut tx, screen_id, item_id, position)
                .await?
            {
                return Ok(None);
            }
        }

        let timer = QueryTimer::new("update_screen_playlist_item");
        let item = sqlx::query_as::<_, PlaylistItemEntity>(
            r#"
            UPDATE playlists
            SET duration = COALESCE($3, duration)
            WHERE screen_id = $1 AND id = $2
            RETURNING id, screen_id, asset_id, duration, position, created_at
            "#,
        )
        .bind(screen_id)
        .bind(item_id)
        .bind(duration)
        .fetch_optional(&mut *tx)
        .await;
        timer.record();

        let item = item?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn delete_item(&self, screen_id: &str, item_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_screen_playlist_item");
        let result = sqlx::query("DELETE FROM playlists WHERE screen_id = $1 AND id = $2")
            .bind(screen_id)
            .bind(item_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Remove every row of the screen's playlist.
    pub async fn clear(&self, screen_id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("clear_screen_playlist");
        let result = sqlx::query("DELETE FROM playlists WHERE screen_id = $1")
            .bind(screen_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
