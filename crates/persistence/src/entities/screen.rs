//! Screen entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the screens table.
#[derive(Debug, Clone, FromRow)]
pub struct ScreenEntity {
    pub id: i64,
    pub screen_id: String,
    pub name: String,
    pub location: Option<String>,
    pub resolution: String,
    pub refresh_interval: i32,
    pub api_key_prefix: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScreenEntity> for domain::models::Screen {
    fn from(entity: ScreenEntity) -> Self {
        Self {
            id: entity.id,
            screen_id: entity.screen_id,
            name: entity.name,
            location: entity.location,
            resolution: entity.resolution,
            refresh_interval: entity.refresh_interval,
            api_key_prefix: Some(entity.api_key_prefix),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Screen row joined with its latest heartbeat and group membership.
#[derive(Debug, Clone, FromRow)]
pub struct ScreenOverviewEntity {
    #[sqlx(flatten)]
    pub screen: ScreenEntity,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub group_id: Option<String>,
    pub group_position: Option<i32>,
}

impl From<ScreenOverviewEntity> for domain::models::screen::ScreenOverview {
    fn from(entity: ScreenOverviewEntity) -> Self {
        Self {
            screen: entity.screen.into(),
            last_heartbeat: entity.last_heartbeat,
            group_id: entity.group_id,
            group_position: entity.group_position,
        }
    }
}
