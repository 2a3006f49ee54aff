//! Keeps screen playlist rows in step with group playlist edits.

use super::store::ContentTx;
use crate::errors::{DomainError, StoreError};
use crate::models::GroupPlaylistItem;

/// Applies a group-level duration to every screen playlist row derived from
/// `(group_id, asset_id)`. Returns the number of rows updated.
///
/// Split content is updated through its tiles, keyed by tile asset id. Content
/// without tiles is updated on each current member's rows for the asset.
pub async fn propagate_duration(
    tx: &mut dyn ContentTx,
    group_id: &str,
    asset_id: &str,
    duration: i32,
) -> Result<u64, StoreError> {
    let tiles = tx.list_split_tiles(group_id, asset_id).await?;
    let mut updated = 0;

    if tiles.is_empty() {
        for member in tx.list_members(group_id).await? {
            updated += tx
                .set_screen_duration(&member.screen_id, asset_id, duration)
                .await?;
        }
    } else {
        for tile in &tiles {
            updated += tx.set_duration_by_asset(&tile.tile_asset_id, duration).await?;
        }
    }

    Ok(updated)
}

/// Edits one group playlist entry. A new position only reorders the group
/// playlist; a new duration is propagated to the derived screen rows.
pub async fn update_group_item(
    tx: &mut dyn ContentTx,
    group_id: &str,
    item_id: i64,
    duration: Option<i32>,
    position: Option<i32>,
) -> Result<GroupPlaylistItem, DomainError> {
    let item = tx
        .update_group_playlist_item(group_id, item_id, duration, position)
        .await?
        .ok_or(DomainError::ItemNotFound)?;

    if let Some(duration) = duration {
        propagate_duration(tx, group_id, &item.original_asset_id, duration).await?;
    }

    Ok(item)
}
