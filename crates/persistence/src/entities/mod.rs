//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod asset;
pub mod heartbeat;
pub mod playlist;
pub mod preset;
pub mod screen;
pub mod screen_group;

pub use asset::AssetEntity;
pub use heartbeat::HeartbeatEntity;
pub use playlist::{
    GroupPlaylistItemDetailEntity, GroupPlaylistItemEntity, PlaylistItemDetailEntity,
    PlaylistItemEntity, SplitTileEntity,
};
pub use preset::{PresetEntity, PresetItemDetailEntity, PresetItemEntity};
pub use screen::{ScreenEntity, ScreenOverviewEntity};
pub use screen_group::{GroupMemberDetailEntity, GroupMemberEntity, ScreenGroupEntity};
