//! Screen repository for database operations.

use sqlx::PgPool;

use crate::entities::{ScreenEntity, ScreenOverviewEntity};
use crate::metrics::QueryTimer;

/// Input for registering a screen.
#[derive(Debug, Clone)]
pub struct NewScreen<'a> {
    pub screen_id: &'a str,
    pub name: &'a str,
    pub location: Option<&'a str>,
    pub resolution: &'a str,
    pub refresh_interval: i32,
    pub api_key_hash: &'a str,
    pub api_key_prefix: &'a str,
}

/// Repository for screen-related database operations.
#[derive(Clone)]
pub struct ScreenRepository {
    pool: PgPool,
}

impl ScreenRepository {
    /// Creates a new ScreenRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All screens, newest first, with their latest heartbeat and group.
    pub async fn list_overview(&self) -> Result<Vec<ScreenOverviewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_screens_overview");
        let result = sqlx::query_as::<_, ScreenOverviewEntity>(
            r#"
            SELECT s.id, s.screen_id, s.name, s.location, s.resolution, s.refresh_interval,
                   s.api_key_prefix, s.created_at, s.updated_at,
                   (SELECT MAX(h.timestamp) FROM heartbeats h WHERE h.screen_id = s.screen_id) AS last_heartbeat,
                   m.group_id, m.position AS group_position
            FROM screens s
            LEFT JOIN screen_group_members m ON m.screen_id = s.screen_id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_screen_id(
        &self,
        screen_id: &str,
    ) -> Result<Option<ScreenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_screen_by_screen_id");
        let result = sqlx::query_as::<_, ScreenEntity>(
            r#"
            SELECT id, screen_id, name, location, resolution, refresh_interval, api_key_prefix, created_at, updated_at
            FROM screens
            WHERE screen_id = $1
            "#,
        )
        .bind(screen_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the screen owning an API key, by the key's SHA-256 hash.
    pub async fn find_by_key_hash(
        &self,
        api_key_hash: &str,
    ) -> Result<Option<ScreenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_screen_by_key_hash");
        let result = sqlx::query_as::<_, ScreenEntity>(
            r#"
            SELECT id, screen_id, name, location, resolution, refresh_interval, api_key_prefix, created_at, updated_at
            FROM screens
            WHERE api_key_hash = $1
            "#,
        )
        .bind(api_key_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, screen: NewScreen<'_>) -> Result<ScreenEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_screen");
        let result = sqlx::query_as::<_, ScreenEntity>(
            r#"
            INSERT INTO screens (screen_id, name, location, resolution, refresh_interval, api_key_hash, api_key_prefix)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, screen_id, name, location, resolution, refresh_interval, api_key_prefix, created_at, updated_at
            "#,
        )
        .bind(screen.screen_id)
        .bind(screen.name)
        .bind(screen.location)
        .bind(screen.resolution)
        .bind(screen.refresh_interval)
        .bind(screen.api_key_hash)
        .bind(screen.api_key_prefix)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        screen_id: &str,
        name: &str,
        location: Option<&str>,
        resolution: &str,
        refresh_interval: i32,
    ) -> Result<Option<ScreenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_screen");
        let result = sqlx::query_as::<_, ScreenEntity>(
            r#"
            UPDATE screens
            SET name = $2, location = $3, resolution = $4, refresh_interval = $5, updated_at = NOW()
            WHERE screen_id = $1
            RETURNING id, screen_id, name, location, resolution, refresh_interval, api_key_prefix, created_at, updated_at
            "#,
        )
        .bind(screen_id)
        .bind(name)
        .bind(location)
        .bind(resolution)
        .bind(refresh_interval)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the screen's API key. The old key stops working immediately.
    pub async fn rotate_key(
        &self,
        screen_id: &str,
        api_key_hash: &str,
        api_key_prefix: &str,
    ) -> Result<Option<ScreenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("rotate_screen_key");
        let result = sqlx::query_as::<_, ScreenEntity>(
            r#"
            UPDATE screens
            SET api_key_hash = $2, api_key_prefix = $3, updated_at = NOW()
            WHERE screen_id = $1
            RETURNING id, screen_id, name, location, resolution, refresh_interval, api_key_prefix, created_at, updated_at
            "#,
        )
        .bind(screen_id)
        .bind(api_key_hash)
        .bind(api_key_prefix)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a screen. Playlist rows, heartbeats and membership cascade.
    pub async fn delete(&self, screen_id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_screen");
        let result = sqlx::query("DELETE FROM screens WHERE screen_id = $1")
            .bind(screen_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
