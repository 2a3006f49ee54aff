//! HTTP route handlers.

use serde::Serialize;

pub mod assets;
pub mod device;
pub mod group_content;
pub mod health;
pub mod presets;
pub mod screen_groups;
pub mod screen_playlists;
pub mod screens;

/// Body for mutations that have nothing else to report.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
