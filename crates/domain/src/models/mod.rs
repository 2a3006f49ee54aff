//! Domain models for the signage backend.

pub mod asset;
pub mod heartbeat;
pub mod layout;
pub mod playlist;
pub mod preset;
pub mod screen;
pub mod screen_group;

pub use asset::{Asset, AssetType, NewAsset};
pub use heartbeat::Heartbeat;
pub use layout::{LayoutSpec, ScreenLayout};
pub use playlist::{GroupPlaylistItem, PlaylistItem, SplitAsset, SplitTile};
pub use preset::{Preset, PresetItem};
pub use screen::Screen;
pub use screen_group::{GroupMember, ScreenGroup};
