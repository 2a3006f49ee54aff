//! Group content distributor: fans one asset out to every member screen.

use tracing::warn;

use super::store::ContentTx;
use super::tile_materializer::{persist_tile, UploadedTile};
use crate::errors::DomainError;
use crate::models::screen_group::is_complete;
use crate::models::{Asset, GroupMember, GroupPlaylistItem, ScreenGroup};

/// Everything an assignment needs once its preconditions hold.
#[derive(Debug, Clone)]
pub struct AssignmentTarget {
    pub group: ScreenGroup,
    pub members: Vec<GroupMember>,
    pub asset: Asset,
}

impl AssignmentTarget {
    pub fn member_at(&self, position: i32) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.position == position)
    }
}

/// Checks, in order: the group exists, every layout position is staffed,
/// the asset exists, and the asset is not already in the group's playlist.
pub async fn check_preconditions(
    tx: &mut dyn ContentTx,
    group_id: &str,
    asset_id: &str,
) -> Result<AssignmentTarget, DomainError> {
    let group = tx
        .find_group(group_id)
        .await?
        .ok_or(DomainError::GroupNotFound)?;

    let members = tx.list_members(group_id).await?;
    if !is_complete(group.layout, members.len()) {
        return Err(DomainError::IncompleteGroup {
            required: group.layout.position_count(),
            assigned: members.len(),
        });
    }

    let asset = tx
        .find_asset(asset_id)
        .await?
        .ok_or(DomainError::AssetNotFound)?;

    if tx.find_group_content(group_id, asset_id).await?.is_some() {
        return Err(DomainError::AlreadyAssigned);
    }

    Ok(AssignmentTarget {
        group,
        members,
        asset,
    })
}

/// Appends the asset itself to every member's playlist, then records the
/// group playlist entry.
pub async fn distribute_video(
    tx: &mut dyn ContentTx,
    target: &AssignmentTarget,
    duration: i32,
) -> Result<GroupPlaylistItem, DomainError> {
    for member in &target.members {
        tx.append_screen_playlist_item(&member.screen_id, &target.asset.asset_id, duration)
            .await?;
    }

    let item = tx
        .append_group_playlist_item(&target.group.group_id, &target.asset.asset_id, duration)
        .await?;
    Ok(item)
}

/// Persists every uploaded tile, appends each one to the playlist of the
/// screen at its position, then records one group playlist entry for the
/// original asset.
pub async fn distribute_tiles(
    tx: &mut dyn ContentTx,
    target: &AssignmentTarget,
    tiles: &[UploadedTile],
    duration: i32,
) -> Result<GroupPlaylistItem, DomainError> {
    let group_id = &target.group.group_id;

    for tile in tiles {
        let tile_asset = persist_tile(tx, group_id, &target.asset, tile).await?;

        match target.member_at(tile.position) {
            Some(member) => {
                tx.append_screen_playlist_item(&member.screen_id, &tile_asset.asset_id, duration)
                    .await?;
            }
            None => {
                warn!(
                    group_id = %group_id,
                    position = tile.position,
                    tile_asset_id = %tile_asset.asset_id,
                    "No screen at tile position, tile not added to any playlist"
                );
            }
        }
    }

    let item = tx
        .append_group_playlist_item(group_id, &target.asset.asset_id, duration)
        .await?;
    Ok(item)
}
