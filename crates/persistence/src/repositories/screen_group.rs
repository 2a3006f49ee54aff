//! Screen group repository for database operations.
//!
//! Plain reads and metadata edits. Membership, content and deletion go
//! through the group content service so their invariants hold.

use sqlx::PgPool;

use crate::entities::{GroupMemberDetailEntity, GroupPlaylistItemDetailEntity, ScreenGroupEntity};
use crate::metrics::QueryTimer;

/// Repository for screen group database operations.
#[derive(Clone)]
pub struct ScreenGroupRepository {
    pool: PgPool,
}

impl ScreenGroupRepository {
    /// Creates a new ScreenGroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self) -> Result<Vec<ScreenGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_screen_groups");
        let result = sqlx::query_as::<_, ScreenGroupEntity>(
            r#"
            SELECT id, group_id, name, layout, description, created_at, updated_at
            FROM screen_groups
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_group_id(
        &self,
        group_id: &str,
    ) -> Result<Option<ScreenGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_screen_group");
        let result = sqlx::query_as::<_, ScreenGroupEntity>(
            r#"
            SELECT id, group_id, name, layout, description, created_at, updated_at
            FROM screen_groups
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        group_id: &str,
        name: &str,
        layout: &str,
        description: Option<&str>,
    ) -> Result<ScreenGroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_screen_group");
        let result = sqlx::query_as::<_, ScreenGroupEntity>(
            r#"
            INSERT INTO screen_groups (group_id, name, layout, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, name, layout, description, created_at, updated_at
            "#,
        )
        .bind(group_id)
        .bind(name)
        .bind(layout)
        .bind(description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        group_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<ScreenGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_screen_group");
        let result = sqlx::query_as::<_, ScreenGroupEntity>(
            r#"
            UPDATE screen_groups
            SET name = $2, description = $3, updated_at = NOW()
            WHERE group_id = $1
            RETURNING id, group_id, name, layout, description, created_at, updated_at
            "#,
        )
        .bind(group_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Members of the given groups with their screens, ordered by position.
    pub async fn list_members(
        &self,
        group_ids: &[String],
    ) -> Result<Vec<GroupMemberDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_screen_group_members");
        let result = sqlx::query_as::<_, GroupMemberDetailEntity>(
            r#"
            SELECT m.group_id, m.screen_id, m.position, s.name, s.location, s.resolution,
                   (SELECT MAX(h.timestamp) FROM heartbeats h WHERE h.screen_id = s.screen_id) AS last_heartbeat
            FROM screen_group_members m
            JOIN screens s ON s.screen_id = m.screen_id
            WHERE m.group_id = ANY($1)
            ORDER BY m.group_id, m.position
            "#,
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The group playlist in play order, joined with original assets.
    pub async fn list_content(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupPlaylistItemDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_content");
        let result = sqlx::query_as::<_, GroupPlaylistItemDetailEntity>(
            r#"
            SELECT g.id, g.group_id, g.original_asset_id, g.duration, g.position, g.created_at,
                   a.filename, a.display_name, a.asset_type, a.url, a.size
            FROM group_playlists g
            JOIN assets a ON a.asset_id = g.original_asset_id
            WHERE g.group_id = $1
            ORDER BY g.position
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
