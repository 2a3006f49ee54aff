//! In-memory storage and blob store used by the engine tests.
//!
//! `MemoryStore` holds its state behind an async mutex and every transaction
//! keeps the lock until it commits or is dropped, so transactions are fully
//! serialized. Writes go to a working copy that replaces the shared state on
//! commit; dropping the transaction discards it.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::blob::{BlobError, BlobStore, StoredBlob};
use super::store::{ContentStore, ContentTx};
use crate::errors::{ConflictKind, StoreError};
use crate::models::{
    Asset, AssetType, GroupMember, GroupPlaylistItem, NewAsset, PlaylistItem, ScreenGroup,
    ScreenLayout, SplitAsset, SplitTile,
};

#[derive(Debug, Clone, Default)]
pub struct State {
    pub screens: Vec<String>,
    pub groups: BTreeMap<String, ScreenGroup>,
    pub members: Vec<GroupMember>,
    pub assets: BTreeMap<String, Asset>,
    pub splits: Vec<SplitAsset>,
    pub playlists: Vec<PlaylistItem>,
    pub group_playlists: Vec<GroupPlaylistItem>,
    /// Operation name that fails with a backend error when reached.
    pub fail_on: Option<&'static str>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn screen_playlist(&self, screen_id: &str) -> Vec<PlaylistItem> {
        let mut items: Vec<PlaylistItem> = self
            .playlists
            .iter()
            .filter(|p| p.screen_id == screen_id)
            .cloned()
            .collect();
        items.sort_by_key(|p| p.position);
        items
    }

    pub fn splits_for(&self, group_id: &str, asset_id: &str) -> Vec<SplitAsset> {
        self.splits
            .iter()
            .filter(|s| s.group_id == group_id && s.original_asset_id == asset_id)
            .cloned()
            .collect()
    }

    pub fn group_items(&self, group_id: &str) -> Vec<GroupPlaylistItem> {
        self.group_playlists
            .iter()
            .filter(|g| g.group_id == group_id)
            .cloned()
            .collect()
    }

    fn check(&self, op: &'static str) -> Result<(), StoreError> {
        if self.fail_on == Some(op) {
            return Err(StoreError::Backend(format!("injected failure in {}", op)));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> State {
        self.state.lock().await.clone()
    }

    pub async fn fail_on(&self, op: &'static str) {
        self.state.lock().await.fail_on = Some(op);
    }

    pub async fn add_screen(&self, screen_id: &str) {
        self.state.lock().await.screens.push(screen_id.to_string());
    }

    pub async fn add_group(&self, group_id: &str, layout: ScreenLayout) {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.groups.insert(
            group_id.to_string(),
            ScreenGroup {
                id,
                group_id: group_id.to_string(),
                name: format!("Group {}", group_id),
                layout,
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    pub async fn add_asset(&self, asset_id: &str, asset_type: AssetType, url: &str) {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let filename = match asset_type {
            AssetType::Image => format!("{}.png", asset_id),
            AssetType::Video => format!("{}.mp4", asset_id),
        };
        state.assets.insert(
            asset_id.to_string(),
            Asset {
                id,
                asset_id: asset_id.to_string(),
                filename,
                display_name: None,
                asset_type,
                size: 0,
                url: url.to_string(),
                created_at: Utc::now(),
            },
        );
    }

    /// Appends a row to a screen playlist outside any group.
    pub async fn add_playlist_item(&self, screen_id: &str, asset_id: &str, duration: i32) {
        let mut tx = MemoryTx::open(self.state.clone()).await;
        tx.append_screen_playlist_item(screen_id, asset_id, duration)
            .await
            .unwrap();
        Box::new(tx).commit().await.unwrap();
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError> {
        Ok(Box::new(MemoryTx::open(self.state.clone()).await))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
}

impl MemoryTx {
    async fn open(state: Arc<Mutex<State>>) -> Self {
        let guard = state.lock_owned().await;
        let work = guard.clone();
        Self { guard, work }
    }
}

#[async_trait]
impl ContentTx for MemoryTx {
    async fn find_group(&mut self, group_id: &str) -> Result<Option<ScreenGroup>, StoreError> {
        self.work.check("find_group")?;
        Ok(self.work.groups.get(group_id).cloned())
    }

    async fn list_members(&mut self, group_id: &str) -> Result<Vec<GroupMember>, StoreError> {
        let mut members: Vec<GroupMember> = self
            .work
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.position);
        Ok(members)
    }

    async fn screen_exists(&mut self, screen_id: &str) -> Result<bool, StoreError> {
        Ok(self.work.screens.iter().any(|s| s == screen_id))
    }

    async fn find_membership(
        &mut self,
        screen_id: &str,
    ) -> Result<Option<GroupMember>, StoreError> {
        Ok(self
            .work
            .members
            .iter()
            .find(|m| m.screen_id == screen_id)
            .cloned())
    }

    async fn insert_member(
        &mut self,
        group_id: &str,
        screen_id: &str,
        position: i32,
    ) -> Result<GroupMember, StoreError> {
        if self.work.members.iter().any(|m| m.screen_id == screen_id) {
            return Err(StoreError::Conflict(ConflictKind::ScreenAlreadyGrouped));
        }
        if self
            .work
            .members
            .iter()
            .any(|m| m.group_id == group_id && m.position == position)
        {
            return Err(StoreError::Conflict(ConflictKind::PositionOccupied));
        }
        let member = GroupMember {
            id: self.work.next_id(),
            group_id: group_id.to_string(),
            screen_id: screen_id.to_string(),
            position,
            created_at: Utc::now(),
        };
        self.work.members.push(member.clone());
        Ok(member)
    }

    async fn delete_member(&mut self, group_id: &str, screen_id: &str) -> Result<u64, StoreError> {
        let before = self.work.members.len();
        self.work
            .members
            .retain(|m| !(m.group_id == group_id && m.screen_id == screen_id));
        Ok((before - self.work.members.len()) as u64)
    }

    async fn delete_group(&mut self, group_id: &str) -> Result<u64, StoreError> {
        let removed = self.work.groups.remove(group_id).is_some();
        self.work.members.retain(|m| m.group_id != group_id);
        self.work.group_playlists.retain(|g| g.group_id != group_id);
        self.work.splits.retain(|s| s.group_id != group_id);
        Ok(removed as u64)
    }

    async fn find_asset(&mut self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        Ok(self.work.assets.get(asset_id).cloned())
    }

    async fn insert_asset(&mut self, asset: &NewAsset) -> Result<Asset, StoreError> {
        self.work.check("insert_asset")?;
        if self.work.assets.contains_key(&asset.asset_id) {
            return Err(StoreError::Conflict(ConflictKind::Duplicate(
                "asset".to_string(),
            )));
        }
        let row = Asset {
            id: self.work.next_id(),
            asset_id: asset.asset_id.clone(),
            filename: asset.filename.clone(),
            display_name: asset.display_name.clone(),
            asset_type: asset.asset_type,
            size: asset.size,
            url: asset.url.clone(),
            created_at: Utc::now(),
        };
        self.work.assets.insert(row.asset_id.clone(), row.clone());
        Ok(row)
    }

    async fn delete_asset(&mut self, asset_id: &str) -> Result<u64, StoreError> {
        let removed = self.work.assets.remove(asset_id).is_some();
        self.work.splits.retain(|s| s.tile_asset_id != asset_id);
        self.work.playlists.retain(|p| p.asset_id != asset_id);
        Ok(removed as u64)
    }

    async fn is_tile_asset(&mut self, asset_id: &str) -> Result<bool, StoreError> {
        Ok(self.work.splits.iter().any(|s| s.tile_asset_id == asset_id))
    }

    async fn insert_split_asset(&mut self, split: &SplitAsset) -> Result<(), StoreError> {
        self.work.splits.push(split.clone());
        Ok(())
    }

    async fn list_split_tiles(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Vec<SplitTile>, StoreError> {
        let mut tiles: Vec<SplitTile> = self
            .work
            .splits_for(group_id, original_asset_id)
            .into_iter()
            .map(|s| SplitTile {
                url: self.work.assets.get(&s.tile_asset_id).map(|a| a.url.clone()),
                tile_asset_id: s.tile_asset_id,
                position: s.position,
            })
            .collect();
        tiles.sort_by_key(|t| t.position);
        Ok(tiles)
    }

    async fn delete_split_assets(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError> {
        let before = self.work.splits.len();
        self.work
            .splits
            .retain(|s| !(s.group_id == group_id && s.original_asset_id == original_asset_id));
        Ok((before - self.work.splits.len()) as u64)
    }

    async fn groups_for_asset(
        &mut self,
        original_asset_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .work
            .group_playlists
            .iter()
            .filter(|g| g.original_asset_id == original_asset_id)
            .map(|g| g.group_id.clone())
            .collect())
    }

    async fn append_screen_playlist_item(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<PlaylistItem, StoreError> {
        self.work.check("append_screen_playlist_item")?;
        let position = self
            .work
            .playlists
            .iter()
            .filter(|p| p.screen_id == screen_id)
            .map(|p| p.position)
            .max()
            .unwrap_or(0)
            + 1;
        let item = PlaylistItem {
            id: self.work.next_id(),
            screen_id: screen_id.to_string(),
            asset_id: asset_id.to_string(),
            duration,
            position,
            created_at: Utc::now(),
        };
        self.work.playlists.push(item.clone());
        Ok(item)
    }

    async fn delete_playlist_items_by_asset(&mut self, asset_id: &str) -> Result<u64, StoreError> {
        let before = self.work.playlists.len();
        self.work.playlists.retain(|p| p.asset_id != asset_id);
        Ok((before - self.work.playlists.len()) as u64)
    }

    async fn delete_screen_playlist_items(
        &mut self,
        screen_id: &str,
        asset_id: &str,
    ) -> Result<u64, StoreError> {
        let before = self.work.playlists.len();
        self.work
            .playlists
            .retain(|p| !(p.screen_id == screen_id && p.asset_id == asset_id));
        Ok((before - self.work.playlists.len()) as u64)
    }

    async fn set_duration_by_asset(
        &mut self,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError> {
        let mut updated = 0;
        for item in self.work.playlists.iter_mut().filter(|p| p.asset_id == asset_id) {
            item.duration = duration;
            updated += 1;
        }
        Ok(updated)
    }

    async fn set_screen_duration(
        &mut self,
        screen_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<u64, StoreError> {
        let mut updated = 0;
        for item in self
            .work
            .playlists
            .iter_mut()
            .filter(|p| p.screen_id == screen_id && p.asset_id == asset_id)
        {
            item.duration = duration;
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_group_content(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<Option<GroupPlaylistItem>, StoreError> {
        Ok(self
            .work
            .group_playlists
            .iter()
            .find(|g| g.group_id == group_id && g.original_asset_id == original_asset_id)
            .cloned())
    }

    async fn list_group_content_assets(
        &mut self,
        group_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut items = self.work.group_items(group_id);
        items.sort_by_key(|g| g.position);
        Ok(items.into_iter().map(|g| g.original_asset_id).collect())
    }

    async fn append_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
        duration: i32,
    ) -> Result<GroupPlaylistItem, StoreError> {
        self.work.check("append_group_playlist_item")?;
        if self
            .work
            .group_playlists
            .iter()
            .any(|g| g.group_id == group_id && g.original_asset_id == original_asset_id)
        {
            return Err(StoreError::Conflict(ConflictKind::DuplicateGroupContent));
        }
        let position = self
            .work
            .group_playlists
            .iter()
            .filter(|g| g.group_id == group_id)
            .map(|g| g.position)
            .max()
            .unwrap_or(0)
            + 1;
        let item = GroupPlaylistItem {
            id: self.work.next_id(),
            group_id: group_id.to_string(),
            original_asset_id: original_asset_id.to_string(),
            duration,
            position,
            created_at: Utc::now(),
        };
        self.work.group_playlists.push(item.clone());
        Ok(item)
    }

    async fn update_group_playlist_item(
        &mut self,
        group_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<Option<GroupPlaylistItem>, StoreError> {
        let Some(from) = self
            .work
            .group_playlists
            .iter()
            .find(|g| g.group_id == group_id && g.id == item_id)
            .map(|g| g.position)
        else {
            return Ok(None);
        };

        if let Some(to) = position {
            let last = self
                .work
                .group_playlists
                .iter()
                .filter(|g| g.group_id == group_id)
                .map(|g| g.position)
                .max()
                .unwrap_or(1);
            let to = to.clamp(1, last);
            let (low, high) = (from.min(to), from.max(to));
            for row in self
                .work
                .group_playlists
                .iter_mut()
                .filter(|g| g.group_id == group_id)
            {
                if row.id == item_id {
                    row.position = to;
                } else if (low..=high).contains(&row.position) {
                    row.position += if to < from { 1 } else { -1 };
                }
            }
        }

        let Some(item) = self
            .work
            .group_playlists
            .iter_mut()
            .find(|g| g.group_id == group_id && g.id == item_id)
        else {
            return Ok(None);
        };
        if let Some(duration) = duration {
            item.duration = duration;
        }
        Ok(Some(item.clone()))
    }

    async fn delete_group_playlist_item(
        &mut self,
        group_id: &str,
        original_asset_id: &str,
    ) -> Result<u64, StoreError> {
        let before = self.work.group_playlists.len();
        self.work
            .group_playlists
            .retain(|g| !(g.group_id == group_id && g.original_asset_id == original_asset_id));
        Ok((before - self.work.group_playlists.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, work } = *self;
        work.check("commit")?;
        *guard = work;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BlobState {
    objects: BTreeMap<String, Vec<u8>>,
    content_types: BTreeMap<String, String>,
    deleted: Vec<String>,
    puts: usize,
    fail_put_after: Option<usize>,
    fail_deletes: bool,
}

/// Blob store keeping objects in memory, with switchable failures.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<std::sync::Mutex<BlobState>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` directly under `url`.
    pub fn insert(&self, url: &str, bytes: Vec<u8>) {
        self.inner.lock().unwrap().objects.insert(url.to_string(), bytes);
    }

    /// Lets `count` more puts succeed, then fails every later one.
    pub fn fail_puts_after(&self, count: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_put_after = Some(inner.puts + count);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_deletes = fail;
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(url)
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.inner.lock().unwrap().deleted.clone()
    }

    /// Content type a blob was uploaded with.
    pub fn content_type(&self, url: &str) -> Option<String> {
        self.inner.lock().unwrap().content_types.get(url).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, BlobError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_put_after.is_some_and(|limit| inner.puts >= limit) {
            return Err(BlobError::Upload("injected upload failure".to_string()));
        }
        inner.puts += 1;
        let pathname = shared::ids::with_random_suffix(pathname);
        let url = format!("memory://{}", pathname);
        let size = bytes.len() as u64;
        inner.objects.insert(url.clone(), bytes);
        inner
            .content_types
            .insert(url.clone(), content_type.to_string());
        Ok(StoredBlob {
            url,
            pathname,
            size,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BlobError> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(url)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(url.to_string()))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(BlobError::Delete("injected delete failure".to_string()));
        }
        inner.objects.remove(url);
        inner.deleted.push(url.to_string());
        Ok(())
    }
}

/// Encodes a gradient PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
