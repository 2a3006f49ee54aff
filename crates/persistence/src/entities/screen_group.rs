//! Screen group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::ScreenLayout;
use sqlx::FromRow;

/// Database row mapping for the screen_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct ScreenGroupEntity {
    pub id: i64,
    pub group_id: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub layout: ScreenLayout,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScreenGroupEntity> for domain::models::ScreenGroup {
    fn from(entity: ScreenGroupEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            name: entity.name,
            layout: entity.layout,
            description: entity.description,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the screen_group_members table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberEntity {
    pub id: i64,
    pub group_id: String,
    pub screen_id: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<GroupMemberEntity> for domain::models::GroupMember {
    fn from(entity: GroupMemberEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            screen_id: entity.screen_id,
            position: entity.position,
            created_at: entity.created_at,
        }
    }
}

/// Member row joined with its screen and latest heartbeat.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberDetailEntity {
    pub group_id: String,
    pub screen_id: String,
    pub position: i32,
    pub name: String,
    pub location: Option<String>,
    pub resolution: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl From<GroupMemberDetailEntity> for domain::models::screen_group::GroupMemberDetail {
    fn from(entity: GroupMemberDetailEntity) -> Self {
        Self {
            screen_id: entity.screen_id,
            position: entity.position,
            name: entity.name,
            location: entity.location,
            resolution: entity.resolution,
            last_heartbeat: entity.last_heartbeat,
        }
    }
}
