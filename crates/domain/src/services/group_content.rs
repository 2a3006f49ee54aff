//! Group content service: the entry point for every operation that spans
//! screen groups, their members and their split content.
//!
//! Each operation runs in one storage transaction. Image assignments do the
//! slow work (fetch, split, upload) before opening the write transaction and
//! delete their uploads again if that transaction fails. Retractions commit
//! their metadata first and delete blobs afterwards, best-effort.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use super::blob::BlobStore;
use super::distributor::{self, AssignmentTarget};
use super::image_split::{self, DEFAULT_TILE_QUALITY};
use super::membership;
use super::playlist_sync;
use super::retractor::{self, Retraction};
use super::store::ContentStore;
use super::tile_materializer::{upload_tile, UploadedTile};
use crate::errors::DomainError;
use crate::models::playlist::{
    ContentAssignmentResponse, ContentRemovalResponse, MAX_DURATION_SECS,
};
use crate::models::{AssetType, GroupMember, GroupPlaylistItem};

/// Tunables for content distribution.
#[derive(Debug, Clone, Copy)]
pub struct ContentSettings {
    pub tile_jpeg_quality: u8,
    pub max_duration_secs: i32,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            tile_jpeg_quality: DEFAULT_TILE_QUALITY,
            max_duration_secs: MAX_DURATION_SECS,
        }
    }
}

#[derive(Clone)]
pub struct GroupContentService {
    store: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    settings: ContentSettings,
}

impl GroupContentService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobStore>,
        settings: ContentSettings,
    ) -> Self {
        Self {
            store,
            blobs,
            settings,
        }
    }

    pub fn settings(&self) -> ContentSettings {
        self.settings
    }

    /// Assigns an asset to a complete group.
    ///
    /// Videos are appended as-is to every member playlist. Images are split
    /// for the group's layout and each tile goes to the screen at its
    /// position. Either way the group playlist gains one entry.
    pub async fn assign_content(
        &self,
        group_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<ContentAssignmentResponse, DomainError> {
        self.check_duration(duration)?;

        let mut tx = self.store.begin().await?;
        let target = distributor::check_preconditions(&mut *tx, group_id, asset_id).await?;
        drop(tx);

        let response = match target.asset.asset_type {
            AssetType::Video => {
                let mut tx = self.store.begin().await?;
                let target = distributor::check_preconditions(&mut *tx, group_id, asset_id).await?;
                let item = distributor::distribute_video(&mut *tx, &target, duration).await?;
                tx.commit().await?;

                ContentAssignmentResponse {
                    success: true,
                    asset_type: AssetType::Video,
                    tiles: None,
                    item,
                }
            }
            AssetType::Image => {
                let mut uploaded = Vec::new();
                let result = self
                    .assign_image(&target, duration, &mut uploaded)
                    .await;
                match result {
                    Ok(item) => ContentAssignmentResponse {
                        success: true,
                        asset_type: AssetType::Image,
                        tiles: Some(uploaded.len()),
                        item,
                    },
                    Err(e) => {
                        self.discard_uploads(&uploaded).await;
                        return Err(e);
                    }
                }
            }
        };

        counter!("group_content_assigned_total", "type" => response.asset_type.as_str())
            .increment(1);
        info!(
            group_id = %group_id,
            asset_id = %asset_id,
            asset_type = %response.asset_type,
            tiles = response.tiles.unwrap_or(0),
            duration = duration,
            "Content assigned to group"
        );

        Ok(response)
    }

    /// Splits and uploads the image, then writes every row in one
    /// transaction. Uploaded tiles are pushed onto `uploaded` as they land
    /// so the caller can clean them up on failure.
    async fn assign_image(
        &self,
        target: &AssignmentTarget,
        duration: i32,
        uploaded: &mut Vec<UploadedTile>,
    ) -> Result<GroupPlaylistItem, DomainError> {
        let group_id = target.group.group_id.as_str();
        let asset_id = target.asset.asset_id.as_str();

        let bytes = self.blobs.fetch(&target.asset.url).await?;
        let layout = target.group.layout;
        let quality = self.settings.tile_jpeg_quality;
        let tiles = tokio::task::spawn_blocking(move || {
            image_split::partition(&bytes, layout, quality)
        })
        .await
        .map_err(|e| DomainError::Internal(format!("image split task failed: {}", e)))??;

        for tile in tiles {
            let tile = upload_tile(self.blobs.as_ref(), group_id, &target.asset, tile).await?;
            uploaded.push(tile);
        }
        counter!("tiles_generated_total").increment(uploaded.len() as u64);

        let mut tx = self.store.begin().await?;
        let target = distributor::check_preconditions(&mut *tx, group_id, asset_id).await?;
        let item = distributor::distribute_tiles(&mut *tx, &target, uploaded, duration).await?;
        tx.commit().await?;

        Ok(item)
    }

    async fn discard_uploads(&self, uploaded: &[UploadedTile]) {
        if uploaded.is_empty() {
            return;
        }
        let urls: Vec<String> = uploaded.iter().map(|t| t.blob.url.clone()).collect();
        let failures = retractor::delete_blobs(self.blobs.as_ref(), &urls).await;
        warn!(
            uploaded = urls.len(),
            failures = failures,
            "Discarded tile uploads of a failed assignment"
        );
    }

    /// Removes an asset's content from a group. Missing rows are not errors,
    /// so calling this twice is safe.
    pub async fn remove_content(
        &self,
        group_id: &str,
        asset_id: &str,
    ) -> Result<ContentRemovalResponse, DomainError> {
        let mut tx = self.store.begin().await?;
        let retraction = retractor::retract(&mut *tx, group_id, asset_id).await?;
        tx.commit().await?;

        let blob_failures = retractor::delete_blobs(self.blobs.as_ref(), &retraction.blob_urls).await;
        counter!("group_content_removed_total").increment(1);
        info!(
            group_id = %group_id,
            asset_id = %asset_id,
            tiles = retraction.tiles_removed,
            blob_failures = blob_failures,
            "Content removed from group"
        );

        Ok(ContentRemovalResponse {
            success: true,
            tiles_removed: retraction.tiles_removed,
            blob_failures,
        })
    }

    /// Edits the duration and/or position of a group playlist entry.
    pub async fn update_content(
        &self,
        group_id: &str,
        item_id: i64,
        duration: Option<i32>,
        position: Option<i32>,
    ) -> Result<GroupPlaylistItem, DomainError> {
        if duration.is_none() && position.is_none() {
            return Err(DomainError::Validation(
                "Nothing to update: provide duration or position".to_string(),
            ));
        }
        if let Some(duration) = duration {
            self.check_duration(duration)?;
        }

        let mut tx = self.store.begin().await?;
        let item =
            playlist_sync::update_group_item(&mut *tx, group_id, item_id, duration, position)
                .await?;
        tx.commit().await?;

        info!(
            group_id = %group_id,
            item_id = item_id,
            duration = ?duration,
            position = ?position,
            "Group content updated"
        );
        Ok(item)
    }

    /// Sets the duration of the group entry for `asset_id` and of every
    /// screen playlist row derived from it.
    pub async fn update_duration(
        &self,
        group_id: &str,
        asset_id: &str,
        duration: i32,
    ) -> Result<GroupPlaylistItem, DomainError> {
        self.check_duration(duration)?;

        let mut tx = self.store.begin().await?;
        let item_id = tx
            .find_group_content(group_id, asset_id)
            .await?
            .ok_or(DomainError::ItemNotFound)?
            .id;
        let item =
            playlist_sync::update_group_item(&mut *tx, group_id, item_id, Some(duration), None)
                .await?;
        tx.commit().await?;

        Ok(item)
    }

    pub async fn assign_member(
        &self,
        group_id: &str,
        screen_id: &str,
        position: i32,
    ) -> Result<GroupMember, DomainError> {
        let mut tx = self.store.begin().await?;
        let member = membership::assign(&mut *tx, group_id, screen_id, position).await?;
        tx.commit().await?;

        info!(
            group_id = %group_id,
            screen_id = %screen_id,
            position = position,
            "Screen assigned to group"
        );
        Ok(member)
    }

    /// Idempotent: unassigning a screen that is not a member succeeds.
    pub async fn unassign_member(&self, group_id: &str, screen_id: &str) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let removed = membership::unassign(&mut *tx, group_id, screen_id).await?;
        tx.commit().await?;

        if removed {
            info!(group_id = %group_id, screen_id = %screen_id, "Screen removed from group");
        }
        Ok(())
    }

    /// Retracts all of a group's content, then deletes the group. Members go
    /// with the group row.
    pub async fn delete_group(&self, group_id: &str) -> Result<ContentRemovalResponse, DomainError> {
        let mut tx = self.store.begin().await?;
        if tx.find_group(group_id).await?.is_none() {
            return Err(DomainError::GroupNotFound);
        }

        let mut removed = Retraction::default();
        for asset_id in tx.list_group_content_assets(group_id).await? {
            let retraction = retractor::retract(&mut *tx, group_id, &asset_id).await?;
            removed.tiles_removed += retraction.tiles_removed;
            removed.blob_urls.extend(retraction.blob_urls);
        }
        tx.delete_group(group_id).await?;
        tx.commit().await?;

        let blob_failures = retractor::delete_blobs(self.blobs.as_ref(), &removed.blob_urls).await;
        info!(
            group_id = %group_id,
            tiles = removed.tiles_removed,
            blob_failures = blob_failures,
            "Screen group deleted"
        );

        Ok(ContentRemovalResponse {
            success: true,
            tiles_removed: removed.tiles_removed,
            blob_failures,
        })
    }

    /// Deletes an original asset: its content is retracted from every group
    /// first, then its remaining playlist rows, its row and its blob go.
    pub async fn delete_asset(&self, asset_id: &str) -> Result<ContentRemovalResponse, DomainError> {
        let mut tx = self.store.begin().await?;
        let asset = tx
            .find_asset(asset_id)
            .await?
            .ok_or(DomainError::AssetNotFound)?;

        if tx.is_tile_asset(asset_id).await? {
            return Err(DomainError::Validation(
                "Tile assets belong to their screen group; remove the group content instead"
                    .to_string(),
            ));
        }

        let mut removed = Retraction::default();
        for group_id in tx.groups_for_asset(asset_id).await? {
            let retraction = retractor::retract(&mut *tx, &group_id, asset_id).await?;
            removed.tiles_removed += retraction.tiles_removed;
            removed.blob_urls.extend(retraction.blob_urls);
        }
        tx.delete_playlist_items_by_asset(asset_id).await?;
        tx.delete_asset(asset_id).await?;
        tx.commit().await?;

        removed.blob_urls.push(asset.url);
        let blob_failures = retractor::delete_blobs(self.blobs.as_ref(), &removed.blob_urls).await;
        info!(
            asset_id = %asset_id,
            tiles = removed.tiles_removed,
            blob_failures = blob_failures,
            "Asset deleted"
        );

        Ok(ContentRemovalResponse {
            success: true,
            tiles_removed: removed.tiles_removed,
            blob_failures,
        })
    }

    fn check_duration(&self, duration: i32) -> Result<(), DomainError> {
        if (1..=self.settings.max_duration_secs).contains(&duration) {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "Duration must be between 1 and {} seconds",
                self.settings.max_duration_secs
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScreenLayout;
    use crate::services::testing::{png, MemoryBlobStore, MemoryStore};

    const IMG_URL: &str = "memory://uploads/img1.png";
    const VID_URL: &str = "memory://uploads/vid1.mp4";

    struct Fixture {
        service: GroupContentService,
        store: MemoryStore,
        blobs: MemoryBlobStore,
    }

    async fn fixture(layout: ScreenLayout, screens: &[&str]) -> Fixture {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let service = GroupContentService::new(
            Arc::new(store.clone()),
            Arc::new(blobs.clone()),
            ContentSettings::default(),
        );

        store.add_group("g1", layout).await;
        for screen in ["s0", "s1", "s2", "s3"] {
            store.add_screen(screen).await;
        }
        for (position, screen) in screens.iter().enumerate() {
            service
                .assign_member("g1", screen, position as i32)
                .await
                .unwrap();
        }

        store.add_asset("img1", AssetType::Image, IMG_URL).await;
        blobs.insert(IMG_URL, png(300, 100));
        store.add_asset("vid1", AssetType::Video, VID_URL).await;
        blobs.insert(VID_URL, b"video bytes".to_vec());

        Fixture {
            service,
            store,
            blobs,
        }
    }

    fn playlist_view(state: &crate::services::testing::State, screen: &str) -> Vec<(String, i32)> {
        state
            .screen_playlist(screen)
            .into_iter()
            .map(|p| (p.asset_id, p.duration))
            .collect()
    }

    #[tokio::test]
    async fn test_split_assign_and_remove_end_to_end() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        fx.store.add_asset("other", AssetType::Video, "memory://other.mp4").await;
        fx.store.add_playlist_item("s0", "other", 5).await;

        let before = fx.store.snapshot().await;

        let result = fx.service.assign_content("g1", "img1", 10).await.unwrap();
        assert!(result.success);
        assert_eq!(result.asset_type, AssetType::Image);
        assert_eq!(result.tiles, Some(3));
        assert_eq!(result.item.original_asset_id, "img1");
        assert_eq!(result.item.position, 1);

        let state = fx.store.snapshot().await;
        let splits = state.splits_for("g1", "img1");
        assert_eq!(splits.len(), 3);
        assert_eq!(state.assets.len(), before.assets.len() + 3);
        assert_eq!(state.group_items("g1").len(), 1);

        for split in &splits {
            let screen = format!("s{}", split.position);
            let rows: Vec<_> = state
                .screen_playlist(&screen)
                .into_iter()
                .filter(|p| p.asset_id == split.tile_asset_id)
                .collect();
            assert_eq!(rows.len(), 1, "screen {} should hold its tile once", screen);
            assert_eq!(rows[0].duration, 10);

            let tile = &state.assets[&split.tile_asset_id];
            assert_eq!(tile.filename, format!("tile-{}-img1.png", split.position));
            assert_eq!(tile.asset_type, AssetType::Image);
            let bytes = fx.blobs.fetch(&tile.url).await.unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (100, 100));
        }
        assert_eq!(state.screen_playlist("s0").len(), 2);

        let removal = fx.service.remove_content("g1", "img1").await.unwrap();
        assert!(removal.success);
        assert_eq!(removal.tiles_removed, 3);
        assert_eq!(removal.blob_failures, 0);

        let after = fx.store.snapshot().await;
        for screen in ["s0", "s1", "s2"] {
            assert_eq!(playlist_view(&after, screen), playlist_view(&before, screen));
        }
        assert_eq!(after.assets.len(), before.assets.len());
        assert!(after.splits_for("g1", "img1").is_empty());
        assert!(after.group_items("g1").is_empty());
        assert_eq!(fx.blobs.deleted().len(), 3);
        assert!(fx.blobs.contains(IMG_URL));

        let again = fx.service.remove_content("g1", "img1").await.unwrap();
        assert!(again.success);
        assert_eq!(again.tiles_removed, 0);
    }

    #[tokio::test]
    async fn test_transparent_png_is_split_into_png_tiles() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        let img = image::RgbaImage::from_pixel(300, 100, image::Rgba([0, 128, 255, 64]));
        let mut source = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut source, image::ImageFormat::Png)
            .unwrap();
        fx.blobs.insert(IMG_URL, source.into_inner());

        fx.service.assign_content("g1", "img1", 10).await.unwrap();

        let state = fx.store.snapshot().await;
        for split in state.splits_for("g1", "img1") {
            let tile = &state.assets[&split.tile_asset_id];
            assert_eq!(tile.filename, format!("tile-{}-img1.png", split.position));
            assert!(tile.url.ends_with(".png"), "{}", tile.url);
            assert_eq!(fx.blobs.content_type(&tile.url).as_deref(), Some("image/png"));

            let bytes = fx.blobs.fetch(&tile.url).await.unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
            let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
            assert_eq!(decoded.get_pixel(50, 50), &image::Rgba([0, 128, 255, 64]));
        }
    }

    #[tokio::test]
    async fn test_vertical_group_gets_two_tiles() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        let result = fx.service.assign_content("g1", "img1", 15).await.unwrap();
        assert_eq!(result.tiles, Some(2));

        let state = fx.store.snapshot().await;
        let splits = state.splits_for("g1", "img1");
        assert_eq!(splits.len(), 2);
        let heights: Vec<u32> = {
            let mut heights = Vec::new();
            for split in &splits {
                let url = &state.assets[&split.tile_asset_id].url;
                let bytes = fx.blobs.fetch(url).await.unwrap();
                heights.push(image::load_from_memory(&bytes).unwrap().height());
            }
            heights
        };
        assert_eq!(heights, vec![50, 50]);
    }

    #[tokio::test]
    async fn test_video_goes_to_every_member() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        let result = fx.service.assign_content("g1", "vid1", 20).await.unwrap();
        assert_eq!(result.asset_type, AssetType::Video);
        assert_eq!(result.tiles, None);

        let state = fx.store.snapshot().await;
        for screen in ["s0", "s1", "s2"] {
            assert_eq!(playlist_view(&state, screen), vec![("vid1".to_string(), 20)]);
        }
        assert_eq!(state.group_items("g1").len(), 1);
        assert!(state.splits_for("g1", "vid1").is_empty());

        let removal = fx.service.remove_content("g1", "vid1").await.unwrap();
        assert_eq!(removal.tiles_removed, 0);
        let state = fx.store.snapshot().await;
        for screen in ["s0", "s1", "s2"] {
            assert!(state.screen_playlist(screen).is_empty());
        }
        assert!(state.assets.contains_key("vid1"));
        assert!(fx.blobs.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_group_performs_no_writes() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1"]).await;
        let before = fx.store.snapshot().await;
        let objects = fx.blobs.object_count();

        let err = fx.service.assign_content("g1", "img1", 10).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::IncompleteGroup {
                required: 3,
                assigned: 2
            }
        ));
        assert!(err.to_string().contains("all 3 screens"));

        let after = fx.store.snapshot().await;
        assert_eq!(after.assets.len(), before.assets.len());
        assert!(after.playlists.is_empty());
        assert!(after.group_playlists.is_empty());
        assert_eq!(fx.blobs.object_count(), objects);
    }

    #[tokio::test]
    async fn test_precondition_order() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0"]).await;

        let err = fx.service.assign_content("missing", "img1", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::GroupNotFound));

        // Incompleteness is reported before the missing asset.
        let err = fx.service.assign_content("g1", "missing", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::IncompleteGroup { .. }));

        fx.service.assign_member("g1", "s1", 1).await.unwrap();
        fx.service.assign_member("g1", "s2", 2).await.unwrap();
        let err = fx.service.assign_content("g1", "missing", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::AssetNotFound));
    }

    #[tokio::test]
    async fn test_same_asset_twice_is_rejected() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        fx.service.assign_content("g1", "img1", 10).await.unwrap();
        let objects = fx.blobs.object_count();

        let err = fx.service.assign_content("g1", "img1", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyAssigned));
        assert_eq!(fx.blobs.object_count(), objects);
        assert_eq!(fx.store.snapshot().await.splits.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_duration() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        let err = fx.service.assign_content("g1", "img1", 0).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = fx
            .service
            .assign_content("g1", "img1", MAX_DURATION_SECS + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_undecodable_image() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        fx.blobs.insert(IMG_URL, b"definitely not a png".to_vec());

        let err = fx.service.assign_content("g1", "img1", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::ImageDecode(_)));
        assert!(fx.store.snapshot().await.splits.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_nothing_behind() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        let before = fx.store.snapshot().await;
        let objects = fx.blobs.object_count();
        fx.blobs.fail_puts_after(1);

        let err = fx.service.assign_content("g1", "img1", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));

        let after = fx.store.snapshot().await;
        assert_eq!(after.assets.len(), before.assets.len());
        assert!(after.splits.is_empty());
        assert!(after.playlists.is_empty());
        assert!(after.group_playlists.is_empty());
        assert_eq!(fx.blobs.object_count(), objects);
        assert_eq!(fx.blobs.deleted().len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_rolls_back_and_discards_uploads() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        let objects = fx.blobs.object_count();
        fx.store.fail_on("append_group_playlist_item").await;

        let err = fx.service.assign_content("g1", "img1", 10).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));

        let after = fx.store.snapshot().await;
        assert!(after.splits.is_empty());
        assert!(after.playlists.is_empty());
        assert!(!after.assets.keys().any(|id| id.starts_with("tile-")));
        assert_eq!(fx.blobs.object_count(), objects);
        assert_eq!(fx.blobs.deleted().len(), 3);
    }

    #[tokio::test]
    async fn test_blob_delete_failures_do_not_block_removal() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        fx.service.assign_content("g1", "img1", 10).await.unwrap();
        fx.blobs.fail_deletes(true);

        let removal = fx.service.remove_content("g1", "img1").await.unwrap();
        assert!(removal.success);
        assert_eq!(removal.tiles_removed, 3);
        assert_eq!(removal.blob_failures, 3);

        let state = fx.store.snapshot().await;
        assert!(state.splits.is_empty());
        assert!(state.playlists.is_empty());
        assert!(state.group_playlists.is_empty());
    }

    #[tokio::test]
    async fn test_remove_content_without_anything_assigned() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0"]).await;
        let removal = fx.service.remove_content("g1", "img1").await.unwrap();
        assert!(removal.success);
        let removal = fx.service.remove_content("nope", "nothing").await.unwrap();
        assert!(removal.success);
    }

    #[tokio::test]
    async fn test_duration_update_reaches_only_tile_rows() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        fx.store.add_asset("other", AssetType::Video, "memory://other.mp4").await;
        fx.store.add_playlist_item("s1", "other", 7).await;

        let assigned = fx.service.assign_content("g1", "img1", 10).await.unwrap();
        let item = fx
            .service
            .update_content("g1", assigned.item.id, Some(30), None)
            .await
            .unwrap();
        assert_eq!(item.duration, 30);

        let state = fx.store.snapshot().await;
        let tiles: Vec<String> = state
            .splits_for("g1", "img1")
            .into_iter()
            .map(|s| s.tile_asset_id)
            .collect();
        for row in &state.playlists {
            if tiles.contains(&row.asset_id) {
                assert_eq!(row.duration, 30);
            } else {
                assert_eq!(row.asset_id, "other");
                assert_eq!(row.duration, 7);
            }
        }
        assert_eq!(state.group_items("g1")[0].duration, 30);
    }

    #[tokio::test]
    async fn test_duration_update_for_video_content() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        fx.service.assign_content("g1", "vid1", 10).await.unwrap();

        let item = fx.service.update_duration("g1", "vid1", 45).await.unwrap();
        assert_eq!(item.duration, 45);

        let state = fx.store.snapshot().await;
        for screen in ["s0", "s1"] {
            assert_eq!(playlist_view(&state, screen), vec![("vid1".to_string(), 45)]);
        }

        let err = fx.service.update_duration("g1", "img1", 45).await.unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound));
    }

    #[tokio::test]
    async fn test_position_update_is_local_to_group_playlist() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        let assigned = fx.service.assign_content("g1", "vid1", 10).await.unwrap();
        let before = fx.store.snapshot().await;

        let item = fx
            .service
            .update_content("g1", assigned.item.id, None, Some(5))
            .await
            .unwrap();
        assert_eq!(item.position, 5);
        assert_eq!(item.duration, 10);

        let after = fx.store.snapshot().await;
        assert_eq!(after.playlists, before.playlists);

        let err = fx
            .service
            .update_content("g1", 9999, Some(10), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound));

        let err = fx
            .service
            .update_content("g1", assigned.item.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_swapping_two_entries() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        let first = fx.service.assign_content("g1", "vid1", 10).await.unwrap().item;
        let second = fx.service.assign_content("g1", "img1", 10).await.unwrap().item;
        assert_eq!((first.position, second.position), (1, 2));

        let moved = fx
            .service
            .update_content("g1", first.id, None, Some(2))
            .await
            .unwrap();
        assert_eq!(moved.position, 2);

        let items = fx.store.snapshot().await.group_items("g1");
        let order: Vec<(&str, i32)> = items
            .iter()
            .map(|i| (i.original_asset_id.as_str(), i.position))
            .collect();
        assert!(order.contains(&("img1", 1)));
        assert!(order.contains(&("vid1", 2)));
    }

    #[tokio::test]
    async fn test_moving_to_the_front_shifts_the_rest_back() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        for id in ["a", "b", "c"] {
            fx.store
                .add_asset(id, AssetType::Video, &format!("memory://{}.mp4", id))
                .await;
        }
        let mut ids = Vec::new();
        for id in ["a", "b", "c"] {
            ids.push(fx.service.assign_content("g1", id, 10).await.unwrap().item.id);
        }

        fx.service
            .update_content("g1", ids[2], Some(12), Some(1))
            .await
            .unwrap();

        let state = fx.store.snapshot().await;
        let mut items = state.group_items("g1");
        items.sort_by_key(|i| i.position);
        let order: Vec<&str> = items.iter().map(|i| i.original_asset_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        let positions: Vec<i32> = items.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(items[0].duration, 12);

        // Moving back to the end restores the original order.
        fx.service
            .update_content("g1", ids[2], None, Some(3))
            .await
            .unwrap();
        let mut items = fx.store.snapshot().await.group_items("g1");
        items.sort_by_key(|i| i.position);
        let order: Vec<&str> = items.iter().map(|i| i.original_asset_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        // A target past the end lands on the last slot.
        let moved = fx
            .service
            .update_content("g1", ids[0], None, Some(50))
            .await
            .unwrap();
        assert_eq!(moved.position, 3);
        let mut items = fx.store.snapshot().await.group_items("g1");
        items.sort_by_key(|i| i.position);
        let order: Vec<&str> = items.iter().map(|i| i.original_asset_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_membership_rules() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0"]).await;
        fx.store.add_group("g2", ScreenLayout::Vertical1x2).await;

        let err = fx.service.assign_member("nope", "s1", 0).await.unwrap_err();
        assert!(matches!(err, DomainError::GroupNotFound));

        let err = fx.service.assign_member("g1", "s1", 3).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidPosition { position: 3, max: 2 }));
        let err = fx.service.assign_member("g1", "s1", -1).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidPosition { .. }));

        let err = fx.service.assign_member("g1", "ghost", 1).await.unwrap_err();
        assert!(matches!(err, DomainError::ScreenNotFound));

        // Already grouped, in another group or at another position of the same one.
        let err = fx.service.assign_member("g2", "s0", 0).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyGrouped));
        let err = fx.service.assign_member("g1", "s0", 1).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyGrouped));

        let err = fx.service.assign_member("g1", "s1", 0).await.unwrap_err();
        assert!(matches!(err, DomainError::PositionOccupied));

        let member = fx.service.assign_member("g1", "s1", 1).await.unwrap();
        assert_eq!(member.position, 1);
        assert_eq!(member.group_id, "g1");
    }

    #[tokio::test]
    async fn test_unassign_is_idempotent_and_keeps_content() {
        let fx = fixture(ScreenLayout::Vertical1x2, &["s0", "s1"]).await;
        fx.service.assign_content("g1", "vid1", 10).await.unwrap();

        fx.service.unassign_member("g1", "s1").await.unwrap();
        fx.service.unassign_member("g1", "s1").await.unwrap();
        fx.service.unassign_member("g1", "never-there").await.unwrap();

        let state = fx.store.snapshot().await;
        assert_eq!(state.members.len(), 1);
        assert_eq!(state.screen_playlist("s1").len(), 1);

        // A replacement screen can take the freed position.
        fx.service.assign_member("g1", "s2", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_assignment_to_one_position() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &[]).await;

        let first = {
            let service = fx.service.clone();
            tokio::spawn(async move { service.assign_member("g1", "s0", 0).await })
        };
        let second = {
            let service = fx.service.clone();
            tokio::spawn(async move { service.assign_member("g1", "s1", 0).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(DomainError::PositionOccupied))));
        assert_eq!(fx.store.snapshot().await.members.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_group_retracts_content() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        fx.service.assign_content("g1", "img1", 10).await.unwrap();
        fx.service.assign_content("g1", "vid1", 10).await.unwrap();

        let removal = fx.service.delete_group("g1").await.unwrap();
        assert_eq!(removal.tiles_removed, 3);

        let state = fx.store.snapshot().await;
        assert!(!state.groups.contains_key("g1"));
        assert!(state.members.is_empty());
        assert!(state.splits.is_empty());
        assert!(state.playlists.is_empty());
        assert!(state.assets.contains_key("img1"));
        assert!(state.assets.contains_key("vid1"));

        let err = fx.service.delete_group("g1").await.unwrap_err();
        assert!(matches!(err, DomainError::GroupNotFound));
    }

    #[tokio::test]
    async fn test_delete_asset_retracts_from_groups() {
        let fx = fixture(ScreenLayout::Horizontal3x1, &["s0", "s1", "s2"]).await;
        fx.service.assign_content("g1", "img1", 10).await.unwrap();

        let tile_id = fx.store.snapshot().await.splits[0].tile_asset_id.clone();
        let err = fx.service.delete_asset(&tile_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let removal = fx.service.delete_asset("img1").await.unwrap();
        assert_eq!(removal.tiles_removed, 3);

        let state = fx.store.snapshot().await;
        assert!(!state.assets.contains_key("img1"));
        assert!(state.splits.is_empty());
        assert!(state.group_playlists.is_empty());
        assert!(state.playlists.is_empty());
        assert!(!fx.blobs.contains(IMG_URL));

        let err = fx.service.delete_asset("img1").await.unwrap_err();
        assert!(matches!(err, DomainError::AssetNotFound));
    }
}
