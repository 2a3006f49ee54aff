//! Storage abstraction used by the group content engine.
//!
//! The engine never talks to a database directly. It opens a [`ContentTx`]
//! through a [`ContentStore`], issues the reads and writes it needs, and
//! commits. A transaction dropped without [`ContentTx::commit`] is rolled
//! back, so an early `?` return leaves storage untouched.
//!
//! Implementations must enforce these uniqueness rules themselves and report
//! violations as [`StoreError::Conflict`](crate::StoreError::Conflict):
//! - a screen belongs to at most one group,
//! - a (group, position) pair holds at most one screen,
//! - a (group, original asset) pair has at most one group playlist row,
//! - playlist positions are unique per screen and per group.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{
    Asset, GroupMember, GroupPlaylistItem, NewAsset, PlaylistItem, ScreenGroup, SplitAsset,
    SplitTile,
};

/// Opens units of work against persistent storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError>;
}

/// A single unit of work. Every lookup tolerates absent rows: finders return
/// `None` or an empty list and deletes report the number of rows removed.
#[async_trait]
pub trait ContentTx: Send {
    // Groups and membership

    async fn find_group(&mut self, group_id: &str) -> Result<Option<ScreenGroup>, StoreError>;

    /// Members of a group ordered by position.
    async fn list_members(&mut self, group_id: &str) -> Result<Vec<GroupMember>, StoreError>;

    async fn screen_exists(&mut self, screen_id: &str) -> Result<bool, StoreError>;

    /// The membership of a screen in any group.
    async fn find_membership(&mut self, screen_id: &str)
        -> Result<Option<GroupMember>, StoreError>;

    async fn insert_member(
        &mut self,
        group_id: &str,
        screen_id: &str,
        position: i32,
    ) -> Result<GroupMember, StoreError>;

    async fn delete_member(&mut self, group_id: &str, screen_id: &str) -> Result<u64, StoreError>;

    async fn delete_group(&mut self, group_id: &str) -> Result<u64, StoreError>;

    // Assets and tile linkage

    async fn find_asset(&mut self, asset_id: &str) -> Result<Option<Asset>, StoreError>;

    async fn insert_asset(&mut self, asset: &NewAsset) -> Result<Asset, StoreError>;

    async fn delete_asset(&mut self, asset_id: &str) -> Result<u64, StoreError>;

    /// Whether the asset was generated as a tile of some split.
    async fn is_tile_asset(&mut self, asset_id: &str) -> Result<bool, StoreError>;

    async fn insert_split_asset(&mut self, split: &SplitAsset) -> Result<(), StoreError>;

    /// Tiles derived from `original_asset_id` for a group, ordered by
    /// position. A tile whose asset row is missing is still listed with
    /// `url: None`.
    async fn list_split_tiles(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Vec<SplitTile>, StoreError>;

    async fn delete_split_assets(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError>;

    /// Groups whose playlist references `original_asset_id`.
    async fn groups_for_asset(&mut self, original_asset_id: &str)
        -> Result<Vec<String>, StoreError>;

    // Screen playlists

    /// Appends at the end of the screen's playlist (`max(position) + 1`).
    async fn append_screen_playlist_item(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<PlaylistItem, StoreError>;

    /// Removes every screen playlist row referencing `asset_id`.
    async fn delete_playlist_items_by_asset(&mut self, asset_id: &str) -> Result<u64, StoreError>;

    /// Removes the rows of one screen that reference `asset_id`.
    async fn delete_screen_playlist_items(
        &mut self,
        screen_id: &str,
        asset_id: &str,
    ) -> Result<u64, StoreError>;

    /// Sets the duration on every screen playlist row referencing `asset_id`.
    async fn set_duration_by_asset(
        &mut self,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError>;

    /// Sets the duration on one screen's rows referencing `asset_id`.
    async fn set_screen_duration(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError>;

    // Group playlists

    async fn find_group_content(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Option<GroupPlaylistItem>, StoreError>;

    /// Original asset ids in the group's playlist, ordered by position.
    async fn list_group_content_assets(&mut self, group_id: &str)
        -> Result<Vec<String>, StoreError>;

    /// Appends at the end of the group's playlist (`max(position) + 1`).
    async fn append_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
        duration: i32,
    ) -> Result<GroupPlaylistItem, StoreError>;

    /// Applies the given fields; `None` when the item is not in the group.
    /// A new position moves the item, shifting the entries between its old
    /// and new position by one.
    async fn update_group_playlist_item(
        &mut self,
        group_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<Option<GroupPlaylistItem>, StoreError>;

    async fn delete_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
