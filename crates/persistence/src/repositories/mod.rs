//! Repository implementations for database operations.

pub mod asset;
pub mod content_store;
pub mod heartbeat;
pub mod playlist;
pub mod preset;
pub mod screen;
pub mod screen_group;

pub use asset::AssetRepository;
pub use content_store::{PgContentStore, PgContentTx};
pub use heartbeat::HeartbeatRepository;
pub use playlist::PlaylistRepository;
pub use preset::PresetRepository;
pub use screen::{NewScreen, ScreenRepository};
pub use screen_group::ScreenGroupRepository;
