//! Domain error types.

use thiserror::Error;

use crate::services::blob::BlobError;

/// Uniqueness rules the storage layer enforces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictKind {
    #[error("position already occupied in this group")]
    PositionOccupied,

    #[error("screen is already in a group")]
    ScreenAlreadyGrouped,

    #[error("asset is already assigned to this group")]
    DuplicateGroupContent,

    #[error("playlist position already in use")]
    DuplicatePlaylistPosition,

    #[error("{0} already exists")]
    Duplicate(String),
}

/// Errors raised by storage implementations.
///
/// Backends translate their own constraint-violation representation into
/// [`StoreError::Conflict`] so callers never inspect engine-specific codes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Coarse error category, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unprocessable,
    Upstream,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Group not found")]
    GroupNotFound,

    #[error("Screen not found")]
    ScreenNotFound,

    #[error("Asset not found")]
    AssetNotFound,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Invalid layout '{0}'. Must be 3x1 or 1x2")]
    InvalidLayout(String),

    #[error("Invalid position {position}. Must be 0-{max} for this layout")]
    InvalidPosition { position: i32, max: i32 },

    #[error("Group must have all {required} screens assigned before adding content ({assigned} assigned)")]
    IncompleteGroup { required: i32, assigned: usize },

    #[error("{0}")]
    Validation(String),

    #[error("Screen is already in a group")]
    AlreadyGrouped,

    #[error("Position already occupied in this group")]
    PositionOccupied,

    #[error("Asset is already assigned to this group")]
    AlreadyAssigned,

    #[error("{0}")]
    Conflict(String),

    #[error("Could not decode image: {0}")]
    ImageDecode(String),

    #[error("Image of {width}x{height} is too small to split into {tiles} tiles")]
    ImageTooSmall { width: u32, height: u32, tiles: i32 },

    #[error("Blob storage error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::GroupNotFound
            | DomainError::ScreenNotFound
            | DomainError::AssetNotFound
            | DomainError::ItemNotFound => ErrorKind::NotFound,
            DomainError::InvalidLayout(_)
            | DomainError::InvalidPosition { .. }
            | DomainError::IncompleteGroup { .. }
            | DomainError::Validation(_)
            | DomainError::ImageTooSmall { .. } => ErrorKind::Validation,
            DomainError::AlreadyGrouped
            | DomainError::PositionOccupied
            | DomainError::AlreadyAssigned
            | DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::ImageDecode(_) => ErrorKind::Unprocessable,
            DomainError::Upstream(_) => ErrorKind::Upstream,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(ConflictKind::PositionOccupied) => DomainError::PositionOccupied,
            StoreError::Conflict(ConflictKind::ScreenAlreadyGrouped) => DomainError::AlreadyGrouped,
            StoreError::Conflict(ConflictKind::DuplicateGroupContent) => {
                DomainError::AlreadyAssigned
            }
            StoreError::Conflict(other) => DomainError::Conflict(capitalize(&other.to_string())),
            StoreError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<BlobError> for DomainError {
    fn from(err: BlobError) -> Self {
        DomainError::Upstream(err.to_string())
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflicts_map_to_typed_errors() {
        let err: DomainError = StoreError::Conflict(ConflictKind::PositionOccupied).into();
        assert!(matches!(err, DomainError::PositionOccupied));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: DomainError = StoreError::Conflict(ConflictKind::ScreenAlreadyGrouped).into();
        assert!(matches!(err, DomainError::AlreadyGrouped));

        let err: DomainError = StoreError::Conflict(ConflictKind::DuplicateGroupContent).into();
        assert!(matches!(err, DomainError::AlreadyAssigned));
    }

    #[test]
    fn test_generic_conflict_message() {
        let err: DomainError =
            StoreError::Conflict(ConflictKind::Duplicate("screen".to_string())).into();
        assert_eq!(err.to_string(), "Screen already exists");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_backend_error_is_internal() {
        let err: DomainError = StoreError::Backend("connection reset".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_incomplete_group_message_names_required_count() {
        let err = DomainError::IncompleteGroup {
            required: 3,
            assigned: 2,
        };
        assert!(err.to_string().contains("all 3 screens"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_blob_error_is_upstream() {
        let err: DomainError = BlobError::Upload("timeout".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_not_found_kinds() {
        for err in [
            DomainError::GroupNotFound,
            DomainError::ScreenNotFound,
            DomainError::AssetNotFound,
            DomainError::ItemNotFound,
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }
}
