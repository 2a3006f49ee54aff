//! Screen domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_identifier, validate_not_blank, validate_resolution};
use validator::Validate;

/// A physical display registered with the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: i64,
    pub screen_id: String,
    pub name: String,
    pub location: Option<String>,
    pub resolution: String,
    pub refresh_interval: i32,
    /// Leading characters of the current API key, for operator recognition.
    pub api_key_prefix: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Screen with liveness and grouping information, for operator listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenOverview {
    #[serde(flatten)]
    pub screen: Screen,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub group_id: Option<String>,
    pub group_position: Option<i32>,
}

/// Request payload for registering a screen.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateScreenRequest {
    #[validate(length(min = 1, max = 50, message = "Screen ID must be between 1 and 50 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub screen_id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    #[serde(default = "default_resolution")]
    #[validate(custom(function = "validate_resolution"))]
    pub resolution: String,

    #[serde(default = "default_refresh_interval")]
    #[validate(range(min = 5, max = 86400, message = "Refresh interval must be between 5 and 86400 seconds"))]
    pub refresh_interval: i32,
}

/// Request payload for updating a screen.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateScreenRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    #[serde(default = "default_resolution")]
    #[validate(custom(function = "validate_resolution"))]
    pub resolution: String,

    #[serde(default = "default_refresh_interval")]
    #[validate(range(min = 5, max = 86400, message = "Refresh interval must be between 5 and 86400 seconds"))]
    pub refresh_interval: i32,
}

/// Response carrying a freshly issued API key. The plaintext key is only
/// ever returned here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenWithKeyResponse {
    #[serde(flatten)]
    pub screen: Screen,
    pub api_key: String,
}

/// Configuration served to a screen device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub screen_id: String,
    pub name: String,
    pub resolution: String,
    pub refresh_interval: i32,
    pub location: Option<String>,
}

fn default_resolution() -> String {
    "1920x1080".to_string()
}

fn default_refresh_interval() -> i32 {
    30
}

impl From<Screen> for ScreenConfig {
    fn from(screen: Screen) -> Self {
        Self {
            screen_id: screen.screen_id,
            name: screen.name,
            resolution: screen.resolution,
            refresh_interval: screen.refresh_interval,
            location: screen.location,
        }
    }
}
