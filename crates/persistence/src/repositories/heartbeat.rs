//! Heartbeat repository for database operations.

use sqlx::PgPool;

use crate::entities::HeartbeatEntity;
use crate::metrics::QueryTimer;

/// Repository for heartbeat database operations.
#[derive(Clone)]
pub struct HeartbeatRepository {
    pool: PgPool,
}

impl HeartbeatRepository {
    /// Creates a new HeartbeatRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        screen_id: &str,
        status: &str,
        current_asset: Option<&str>,
        uptime: Option<i64>,
        temperature: Option<f64>,
    ) -> Result<HeartbeatEntity, sqlx::Error> {
        let timer = QueryTimer::new("record_heartbeat");
        let result = sqlx::query_as::<_, HeartbeatEntity>(
            r#"
            INSERT INTO heartbeats (screen_id, status, current_asset, uptime, temperature)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, screen_id, status, current_asset, uptime, temperature, timestamp
            "#,
        )
        .bind(screen_id)
        .bind(status)
        .bind(current_asset)
        .bind(uptime)
        .bind(temperature)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn latest(&self, screen_id: &str) -> Result<Option<HeartbeatEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_heartbeat");
        let result = sqlx::query_as::<_, HeartbeatEntity>(
            r#"
            SELECT id, screen_id, status, current_asset, uptime, temperature, timestamp
            FROM heartbeats
            WHERE screen_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(screen_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
