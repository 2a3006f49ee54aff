//! Tile asset materializer: turns partitioned tiles into stored assets.
//!
//! Materializing is split in two halves so uploads can finish before any row
//! references their URLs: [`upload_tile`] pushes bytes to blob storage and
//! [`persist_tile`] writes the asset and split linkage rows inside the
//! caller's transaction.

use shared::ids::{prefixed_id, slugify};
use tracing::debug;

use super::blob::{BlobError, BlobStore, StoredBlob};
use super::image_split::{Tile, TileFormat};
use super::store::ContentTx;
use crate::errors::StoreError;
use crate::models::{Asset, AssetType, NewAsset, SplitAsset};

/// A tile whose bytes are already in blob storage.
#[derive(Debug, Clone)]
pub struct UploadedTile {
    pub format: TileFormat,
    pub position: i32,
    pub width: u32,
    pub height: u32,
    pub blob: StoredBlob,
}

fn file_stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(filename)
}

/// Filename of the tile at `position`, derived from the original filename
/// with the extension of the tile's own format.
pub fn tile_filename(position: i32, original_filename: &str, format: TileFormat) -> String {
    format!(
        "tile-{}-{}.{}",
        position,
        file_stem(original_filename),
        format.extension()
    )
}

/// Operator-facing name of the tile at `position`.
pub fn tile_display_name(position: i32, original: &Asset) -> String {
    format!("{} (Tile {})", original.label(), position)
}

/// Blob pathname for a tile. The store appends its own random suffix.
pub fn tile_pathname(
    group_id: &str,
    position: i32,
    original_filename: &str,
    format: TileFormat,
) -> String {
    format!(
        "tiles/{}/tile-{}-{}.{}",
        slugify(group_id),
        position,
        slugify(file_stem(original_filename)),
        format.extension()
    )
}

/// Uploads the encoded bytes of one tile.
pub async fn upload_tile(
    blobs: &dyn BlobStore,
    group_id: &str,
    original: &Asset,
    tile: Tile,
) -> Result<UploadedTile, BlobError> {
    let pathname = tile_pathname(group_id, tile.position, &original.filename, tile.format);
    let blob = blobs
        .put(&pathname, tile.bytes, tile.format.content_type())
        .await?;

    debug!(
        group_id = %group_id,
        original_asset_id = %original.asset_id,
        position = tile.position,
        url = %blob.url,
        "Tile uploaded"
    );

    Ok(UploadedTile {
        format: tile.format,
        position: tile.position,
        width: tile.width,
        height: tile.height,
        blob,
    })
}

/// Writes the asset row and the split linkage row for an uploaded tile.
pub async fn persist_tile(
    tx: &mut dyn ContentTx,
    group_id: &str,
    original: &Asset,
    uploaded: &UploadedTile,
) -> Result<Asset, StoreError> {
    let tile_asset = tx
        .insert_asset(&NewAsset {
            asset_id: prefixed_id("tile"),
            filename: tile_filename(uploaded.position, &original.filename, uploaded.format),
            display_name: Some(tile_display_name(uploaded.position, original)),
            asset_type: AssetType::Image,
            size: uploaded.blob.size as i64,
            url: uploaded.blob.url.clone(),
        })
        .await?;

    tx.insert_split_asset(&SplitAsset {
        original_asset_id: original.asset_id.clone(),
        tile_asset_id: tile_asset.asset_id.clone(),
        group_id: group_id.to_string(),
        position: uploaded.position,
    })
    .await?;

    Ok(tile_asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn original(display_name: Option<&str>) -> Asset {
        Asset {
            id: 7,
            asset_id: "img1".to_string(),
            filename: "skyline.png".to_string(),
            display_name: display_name.map(str::to_string),
            asset_type: AssetType::Image,
            size: 1024,
            url: "http://blobs/skyline.png".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tile_filename_embeds_position_and_original() {
        assert_eq!(
            tile_filename(2, "skyline.png", TileFormat::Png),
            "tile-2-skyline.png"
        );
        // The extension follows what the blob actually holds.
        assert_eq!(
            tile_filename(0, "scan.bmp", TileFormat::Jpeg),
            "tile-0-scan.jpg"
        );
    }

    #[test]
    fn test_tile_display_name() {
        assert_eq!(
            tile_display_name(0, &original(Some("City Skyline"))),
            "City Skyline (Tile 0)"
        );
        assert_eq!(tile_display_name(1, &original(None)), "skyline.png (Tile 1)");
    }

    #[test]
    fn test_tile_pathname() {
        assert_eq!(
            tile_pathname("g1", 1, "skyline.png", TileFormat::Png),
            "tiles/g1/tile-1-skyline.png"
        );
        assert_eq!(
            tile_pathname("g1", 0, "noext", TileFormat::Jpeg),
            "tiles/g1/tile-0-noext.jpg"
        );
        assert_eq!(
            tile_pathname("group-1-abc", 0, "Summer Sale!.webp", TileFormat::WebP),
            "tiles/group-1-abc/tile-0-summer-sale.webp"
        );
    }

    #[test]
    fn test_tile_pathname_cannot_escape_its_directory() {
        let path = tile_pathname("g1", 2, "../../etc/passwd.png", TileFormat::Png);
        assert_eq!(path, "tiles/g1/tile-2-etc-passwd.png");
        assert!(!path.contains(".."));

        let path = tile_pathname("g1", 0, "..", TileFormat::Jpeg);
        assert_eq!(path, "tiles/g1/tile-0-asset.jpg");
    }
}
