//! Group content retractor: undoes a distribution.
//!
//! Every step treats "nothing found" as a no-op, so retraction doubles as the
//! recovery path for a partially applied assignment and can be re-run.

use metrics::counter;
use tracing::{debug, warn};

use super::blob::BlobStore;
use super::store::ContentTx;
use crate::errors::StoreError;

/// What a retraction removed inside its transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retraction {
    pub tiles_removed: usize,
    /// Blob URLs of removed tiles, to delete once the transaction commits.
    pub blob_urls: Vec<String>,
}

/// Removes an asset's content from a group.
///
/// Tiles found through the split linkage are pulled from every playlist that
/// references them and their asset rows deleted. When there are no tiles the
/// content was distributed as-is, so the original asset is pulled from each
/// current member's playlist instead.
pub async fn retract(
    tx: &mut dyn ContentTx,
    group_id: &str,
    asset_id: &str,
) -> Result<Retraction, StoreError> {
    let tiles = tx.list_split_tiles(group_id, asset_id).await?;
    let mut retraction = Retraction::default();

    for tile in &tiles {
        tx.delete_playlist_items_by_asset(&tile.tile_asset_id).await?;
        tx.delete_asset(&tile.tile_asset_id).await?;
        if let Some(url) = &tile.url {
            retraction.blob_urls.push(url.clone());
        }
        retraction.tiles_removed += 1;
    }

    tx.delete_split_assets(group_id, asset_id).await?;
    tx.delete_group_playlist_item(group_id, asset_id).await?;

    if tiles.is_empty() {
        for member in tx.list_members(group_id).await? {
            tx.delete_screen_playlist_items(&member.screen_id, asset_id)
                .await?;
        }
    }

    debug!(
        group_id = %group_id,
        asset_id = %asset_id,
        tiles = retraction.tiles_removed,
        "Group content retracted"
    );

    Ok(retraction)
}

/// Deletes blobs one by one, returning how many failed.
///
/// Failures are logged and counted; they never stop the remaining deletes.
pub async fn delete_blobs(blobs: &dyn BlobStore, urls: &[String]) -> usize {
    let mut failures = 0;
    for url in urls {
        if let Err(e) = blobs.delete(url).await {
            failures += 1;
            counter!("blob_delete_failures_total").increment(1);
            warn!(url = %url, error = %e, "Failed to delete blob, leaving it orphaned");
        }
    }
    failures
}
