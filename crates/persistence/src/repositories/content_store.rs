//! PostgreSQL implementation of the domain content store.
//!
//! Each [`PgContentTx`] wraps one database transaction. Appends to a playlist
//! take a transaction-scoped advisory lock on the playlist's owner before
//! reading `max(position)`, so concurrent appends to the same screen or
//! group queue up instead of racing. Position moves take the same lock and
//! shift the rows in between, so a reorder never trips over an occupied slot.
//! The unique constraints in the schema remain the final guard and are
//! reported as typed conflicts.

use async_trait::async_trait;
use domain::errors::{ConflictKind, StoreError};
use domain::models::{
    Asset, GroupMember, GroupPlaylistItem, NewAsset, PlaylistItem, ScreenGroup, SplitAsset,
    SplitTile,
};
use domain::services::store::{ContentStore, ContentTx};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::entities::{
    AssetEntity, GroupMemberEntity, GroupPlaylistItemEntity, PlaylistItemEntity,
    ScreenGroupEntity, SplitTileEntity,
};
use crate::metrics::QueryTimer;

/// Maps a violated unique constraint to the conflict it represents.
pub fn conflict_for_constraint(constraint: Option<&str>) -> ConflictKind {
    match constraint {
        Some("screen_group_members_group_position_key") => ConflictKind::PositionOccupied,
        Some("screen_group_members_screen_key") => ConflictKind::ScreenAlreadyGrouped,
        Some("group_playlists_group_asset_key") => ConflictKind::DuplicateGroupContent,
        Some("group_playlists_group_position_key") | Some("playlists_screen_position_key") => {
            ConflictKind::DuplicatePlaylistPosition
        }
        Some("screens_screen_id_key") => ConflictKind::Duplicate("screen".to_string()),
        Some("screen_groups_group_id_key") => ConflictKind::Duplicate("group".to_string()),
        Some("assets_asset_id_key") | Some("split_assets_tile_asset_id_key") => {
            ConflictKind::Duplicate("asset".to_string())
        }
        _ => ConflictKind::Duplicate("record".to_string()),
    }
}

/// Converts a sqlx error, turning unique violations into typed conflicts.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(conflict_for_constraint(db_err.constraint()));
        }
    }
    StoreError::Backend(err.to_string())
}

/// Serializes playlist appends and moves for one owner until the transaction ends.
async fn lock_playlist(conn: &mut PgConnection, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

/// Appends an asset to the end of a screen's playlist.
pub async fn append_screen_playlist_item(
    conn: &mut PgConnection,
    screen_id: &str,
    asset_id: &str,
    duration: i32,
) -> Result<PlaylistItemEntity, sqlx::Error> {
    let timer = QueryTimer::new("append_screen_playlist_item");
    lock_playlist(&mut *conn, &PlaylistTable::Screen.lock_key(screen_id)).await?;
    let result = sqlx::query_as::<_, PlaylistItemEntity>(
        r#"
        INSERT INTO playlists (screen_id, asset_id, duration, position)
        SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1
        FROM playlists
        WHERE screen_id = $1
        RETURNING id, screen_id, asset_id, duration, position, created_at
        "#,
    )
    .bind(screen_id)
    .bind(asset_id)
    .bind(duration)
    .fetch_one(&mut *conn)
    .await;
    timer.record();
    result
}

/// Appends an original asset to the end of a group's playlist.
pub async fn append_group_playlist_item(
    conn: &mut PgConnection,
    group_id: &str,
    original_asset_id: &str,
    duration: i32,
) -> Result<GroupPlaylistItemEntity, sqlx::Error> {
    let timer = QueryTimer::new("append_group_playlist_item");
    lock_playlist(&mut *conn, &PlaylistTable::Group.lock_key(group_id)).await?;
    let result = sqlx::query_as::<_, GroupPlaylistItemEntity>(
        r#"
        INSERT INTO group_playlists (group_id, original_asset_id, duration, position)
        SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1
        FROM group_playlists
        WHERE group_id = $1
        RETURNING id, group_id, original_asset_id, duration, position, created_at
        "#,
    )
    .bind(group_id)
    .bind(original_asset_id)
    .bind(duration)
    .fetch_one(&mut *conn)
    .await;
    timer.record();
    result
}

/// Which playlist a row lives in.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PlaylistTable {
    Screen,
    Group,
    Preset,
}

impl PlaylistTable {
    fn table(self) -> &'static str {
        match self {
            PlaylistTable::Screen => "playlists",
            PlaylistTable::Group => "group_playlists",
            PlaylistTable::Preset => "preset_playlist_items",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            PlaylistTable::Screen => "screen_id",
            PlaylistTable::Group => "group_id",
            PlaylistTable::Preset => "preset_id",
        }
    }

    fn lock_key(self, owner: &str) -> String {
        match self {
            PlaylistTable::Screen => format!("playlist:screen:{}", owner),
            PlaylistTable::Group => format!("playlist:group:{}", owner),
            PlaylistTable::Preset => format!("playlist:preset:{}", owner),
        }
    }
}

/// Takes the append/move lock of one playlist until the transaction ends.
pub(crate) async fn lock_owner(
    conn: &mut PgConnection,
    playlist: PlaylistTable,
    owner: &str,
) -> Result<(), sqlx::Error> {
    lock_playlist(conn, &playlist.lock_key(owner)).await
}

/// Moves one row to position `to`. Rows between the old and the new position
/// shift by one towards the gap, so two entries swap when they are adjacent.
/// A target past the end lands on the last position.
/// Returns `false` when the row does not exist.
async fn move_playlist_row(
    conn: &mut PgConnection,
    playlist: PlaylistTable,
    owner: &str,
    item_id: i64,
    to: i32,
) -> Result<bool, sqlx::Error> {
    lock_playlist(&mut *conn, &playlist.lock_key(owner)).await?;

    let select = format!(
        "SELECT position FROM {} WHERE {} = $1 AND id = $2 FOR UPDATE",
        playlist.table(),
        playlist.owner_column()
    );
    let from = sqlx::query_scalar::<_, i32>(&select)
        .bind(owner)
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(from) = from else {
        return Ok(false);
    };

    let last = format!(
        "SELECT COALESCE(MAX(position), 1) FROM {} WHERE {} = $1",
        playlist.table(),
        playlist.owner_column()
    );
    let last = sqlx::query_scalar::<_, i32>(&last)
        .bind(owner)
        .fetch_one(&mut *conn)
        .await?;
    let to = to.clamp(1, last);
    if from == to {
        return Ok(true);
    }

    let shift = format!(
        r#"
        UPDATE {}
        SET position = CASE
            WHEN id = $2 THEN $4
            WHEN $4 < $3 THEN position + 1
            ELSE position - 1
        END
        WHERE {} = $1
          AND (id = $2 OR position BETWEEN LEAST($3, $4) AND GREATEST($3, $4))
        "#,
        playlist.table(),
        playlist.owner_column()
    );
    sqlx::query(&shift)
        .bind(owner)
        .bind(item_id)
        .bind(from)
        .bind(to)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

/// Moves a screen playlist row. See [`move_playlist_row`].
pub async fn move_screen_playlist_item(
    conn: &mut PgConnection,
    screen_id: &str,
    item_id: i64,
    to: i32,
) -> Result<bool, sqlx::Error> {
    let timer = QueryTimer::new("move_screen_playlist_item");
    let result = move_playlist_row(conn, PlaylistTable::Screen, screen_id, item_id, to).await;
    timer.record();
    result
}

/// Moves a preset row. See [`move_playlist_row`].
pub async fn move_preset_playlist_item(
    conn: &mut PgConnection,
    preset_id: &str,
    item_id: i64,
    to: i32,
) -> Result<bool, sqlx::Error> {
    let timer = QueryTimer::new("move_preset_playlist_item");
    let result = move_playlist_row(conn, PlaylistTable::Preset, preset_id, item_id, to).await;
    timer.record();
    result
}

/// Moves a group playlist row. See [`move_playlist_row`].
pub async fn move_group_playlist_item(
    conn: &mut PgConnection,
    group_id: &str,
    item_id: i64,
    to: i32,
) -> Result<bool, sqlx::Error> {
    let timer = QueryTimer::new("move_group_playlist_item");
    let result = move_playlist_row(conn, PlaylistTable::Group, group_id, item_id, to).await;
    timer.record();
    result
}

/// Content store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(Box::new(PgContentTx { tx }))
    }
}

/// One content-store transaction. Rolled back on drop unless committed.
pub struct PgContentTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ContentTx for PgContentTx {
    async fn find_group(&mut self, group_id: &str) -> Result<Option<ScreenGroup>, StoreError> {
        let group = sqlx::query_as::<_, ScreenGroupEntity>(
            r#"
            SELECT id, group_id, name, layout, description, created_at, updated_at
            FROM screen_groups
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(group.map(Into::into))
    }

    async fn list_members(&mut self, group_id: &str) -> Result<Vec<GroupMember>, StoreError> {
        let members = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT id, group_id, screen_id, position, created_at
            FROM screen_group_members
            WHERE group_id = $1
            ORDER BY position
            "#,
        )
        .bind(group_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    async fn screen_exists(&mut self, screen_id: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM screens WHERE screen_id = $1)",
        )
        .bind(screen_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)
    }

    async fn find_membership(
        &mut self,
        screen_id: &str,
    ) -> Result<Option<GroupMember>, StoreError> {
        let member = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT id, group_id, screen_id, position, created_at
            FROM screen_group_members
            WHERE screen_id = $1
            "#,
        )
        .bind(screen_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(member.map(Into::into))
    }

    async fn insert_member(
        &mut self,
        group_id: &str,
        screen_id: &str,
        position: i32,
    ) -> Result<GroupMember, StoreError> {
        let member = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            INSERT INTO screen_group_members (group_id, screen_id, position)
            VALUES ($1, $2, $3)
            RETURNING id, group_id, screen_id, position, created_at
            "#,
        )
        .bind(group_id)
        .bind(screen_id)
        .bind(position)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(member.into())
    }

    async fn delete_member(&mut self, group_id: &str, screen_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM screen_group_members WHERE group_id = $1 AND screen_id = $2",
        )
        .bind(group_id)
        .bind(screen_id)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn delete_group(&mut self, group_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM screen_groups WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn find_asset(&mut self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        let asset = sqlx::query_as::<_, AssetEntity>(
            r#"
            SELECT id, asset_id, filename, display_name, asset_type, size, url, created_at
            FROM assets
            WHERE asset_id = $1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(asset.map(Into::into))
    }

    async fn insert_asset(&mut self, asset: &NewAsset) -> Result<Asset, StoreError> {
        let row = sqlx::query_as::<_, AssetEntity>(
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
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(row.into())
    }

    async fn delete_asset(&mut self, asset_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM assets WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn is_tile_asset(&mut self, asset_id: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM split_assets WHERE tile_asset_id = $1)",
        )
        .bind(asset_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)
    }

    async fn insert_split_asset(&mut self, split: &SplitAsset) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO split_assets (original_asset_id, tile_asset_id, group_id, position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&split.original_asset_id)
        .bind(&split.tile_asset_id)
        .bind(&split.group_id)
        .bind(split.position)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_split_tiles(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Vec<SplitTile>, StoreError> {
        let tiles = sqlx::query_as::<_, SplitTileEntity>(
            r#"
            SELECT sa.tile_asset_id, sa.position, a.url
            FROM split_assets sa
            LEFT JOIN assets a ON a.asset_id = sa.tile_asset_id
            WHERE sa.group_id = $1 AND sa.original_asset_id = $2
            ORDER BY sa.position
            "#,
        )
        .bind(group_id)
        .bind(original_asset_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(tiles.into_iter().map(Into::into).collect())
    }

    async fn delete_split_assets(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM split_assets WHERE group_id = $1 AND original_asset_id = $2",
        )
        .bind(group_id)
        .bind(original_asset_id)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn groups_for_asset(
        &mut self,
        original_asset_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT group_id FROM group_playlists WHERE original_asset_id = $1
            UNION
            SELECT DISTINCT group_id FROM split_assets WHERE original_asset_id = $1
            "#,
        )
        .bind(original_asset_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)
    }

    async fn append_screen_playlist_item(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<PlaylistItem, StoreError> {
        let item = append_screen_playlist_item(&mut self.tx, screen_id, asset_id, duration)
            .await
            .map_err(store_error)?;
        Ok(item.into())
    }

    async fn delete_playlist_items_by_asset(&mut self, asset_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM playlists WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn delete_screen_playlist_items(
        &mut self,
        screen_id: &str,
        asset_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM playlists WHERE screen_id = $1 AND asset_id = $2")
            .bind(screen_id)
            .bind(asset_id)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn set_duration_by_asset(
        &mut self,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE playlists SET duration = $2 WHERE asset_id = $1")
            .bind(asset_id)
            .bind(duration)
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn set_screen_duration(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE playlists SET duration = $3 WHERE screen_id = $1 AND asset_id = $2",
        )
        .bind(screen_id)
        .bind(asset_id)
        .bind(duration)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn find_group_content(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Option<GroupPlaylistItem>, StoreError> {
        let item = sqlx::query_as::<_, GroupPlaylistItemEntity>(
            r#"
            SELECT id, group_id, original_asset_id, duration, position, created_at
            FROM group_playlists
            WHERE group_id = $1 AND original_asset_id = $2
            "#,
        )
        .bind(group_id)
        .bind(original_asset_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(item.map(Into::into))
    }

    async fn list_group_content_assets(
        &mut self,
        group_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_asset_id FROM group_playlists WHERE group_id = $1
            UNION
            SELECT DISTINCT original_asset_id FROM split_assets WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)
    }

    async fn append_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
        duration: i32,
    ) -> Result<GroupPlaylistItem, StoreError> {
        let item = append_group_playlist_item(&mut self.tx, group_id, original_asset_id, duration)
            .await
            .map_err(store_error)?;
        Ok(item.into())
    }

    async fn update_group_playlist_item(
        &mut self,
        group_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<Option<GroupPlaylistItem>, StoreError> {
        if let Some(position) = position {
            let moved = move_group_playlist_item(&mut self.tx, group_id, item_id, position)
                .await
                .map_err(store_error)?;
            if !moved {
                return Ok(None);
            }
        }

        let item = sqlx::query_as::<_, GroupPlaylistItemEntity>(
            r#"
            UPDATE group_playlists
            SET duration = COALESCE($3, duration)
            WHERE group_id = $1 AND id = $2
            RETURNING id, group_id, original_asset_id, duration, position, created_at
            "#,
        )
        .bind(group_id)
        .bind(item_id)
        .bind(duration)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(item.map(Into::into))
    }

    async fn delete_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM group_playlists WHERE group_id = $1 AND original_asset_id = $2",
        )
        .bind(group_id)
        .bind(original_asset_id)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_constraints_map_to_specific_conflicts() {
        assert_eq!(
            conflict_for_constraint(Some("screen_group_members_group_position_key")),
            ConflictKind::PositionOccupied
        );
        assert_eq!(
            conflict_for_constraint(Some("screen_group_members_screen_key")),
            ConflictKind::ScreenAlreadyGrouped
        );
    }

    #[test]
    fn test_playlist_constraints() {
        assert_eq!(
            conflict_for_constraint(Some("group_playlists_group_asset_key")),
            ConflictKind::DuplicateGroupContent
        );
        assert_eq!(
            conflict_for_constraint(Some("playlists_screen_position_key")),
            ConflictKind::DuplicatePlaylistPosition
        );
    }

    #[test]
    fn test_unknown_constraint_is_generic_duplicate() {
        assert_eq!(
            conflict_for_constraint(Some("something_else")),
            ConflictKind::Duplicate("record".to_string())
        );
        assert_eq!(
            conflict_for_constraint(None),
            ConflictKind::Duplicate("record".to_string())
        );
    }

    #[test]
    fn test_non_database_errors_are_backend_errors() {
        let err = store_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
