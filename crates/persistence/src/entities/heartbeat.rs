//! Heartbeat entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the heartbeats table.
#[derive(Debug, Clone, FromRow)]
pub struct HeartbeatEntity {
    pub id: i64,
    pub screen_id: String,
    pub status: String,
    pub current_asset: Option<String>,
    pub uptime: Option<i64>,
    pub temperature: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl From<HeartbeatEntity> for domain::models::Heartbeat {
    fn from(entity: HeartbeatEntity) -> Self {
        Self {
            id: entity.id,
            screen_id: entity.screen_id,
            status: entity.status,
            current_asset: entity.current_asset,
            uptime: entity.uptime,
            temperature: entity.temperature,
            timestamp: entity.timestamp,
        }
    }
}
