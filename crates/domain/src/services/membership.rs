//! Screen group membership manager.

use super::store::ContentTx;
use crate::errors::DomainError;
use crate::models::GroupMember;

/// Places a screen at a group position.
///
/// Pre-checks run in order: group, position bounds, screen, existing
/// membership. A concurrent writer that takes the position between the
/// checks and the insert surfaces as [`DomainError::PositionOccupied`]
/// through the store's uniqueness constraint.
pub async fn assign(
    tx: &mut dyn ContentTx,
    group_id: &str,
    screen_id: &str,
    position: i32,
) -> Result<GroupMember, DomainError> {
    let group = tx
        .find_group(group_id)
        .await?
        .ok_or(DomainError::GroupNotFound)?;

    if !group.layout.contains_position(position) {
        return Err(DomainError::InvalidPosition {
            position,
            max: group.layout.max_position(),
        });
    }

    if !tx.screen_exists(screen_id).await? {
        return Err(DomainError::ScreenNotFound);
    }

    if tx.find_membership(screen_id).await?.is_some() {
        return Err(DomainError::AlreadyGrouped);
    }

    let member = tx.insert_member(group_id, screen_id, position).await?;
    Ok(member)
}

/// Removes a screen from a group. Returns whether a membership existed.
///
/// Content already on the screen's playlist is left alone.
pub async fn unassign(
    tx: &mut dyn ContentTx,
    group_id: &str,
    screen_id: &str,
) -> Result<bool, DomainError> {
    Ok(tx.delete_member(group_id, screen_id).await? > 0)
}
