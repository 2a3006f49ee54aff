//! Asset domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// Kind of media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
}

impl AssetType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
        }
    }

    /// Classifies a MIME type; anything other than `image/*` or `video/*` is
    /// not displayable media.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("image/") {
            Some(AssetType::Image)
        } else if essence.starts_with("video/") {
            Some(AssetType::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AssetType::Image),
            "video" => Ok(AssetType::Video),
            other => Err(DomainError::Validation(format!(
                "Unknown asset type '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for AssetType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An uploaded or system-generated media object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: i64,
    pub asset_id: String,
    pub filename: String,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub size: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Name shown to operators: the display name, or the filename.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.filename)
    }
}

/// Insert payload for a new asset row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub asset_id: String,
    pub filename: String,
    pub display_name: Option<String>,
    pub asset_type: AssetType,
    pub size: i64,
    pub url: String,
}

/// Query parameters for asset listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsQuery {
    #[serde(default)]
    pub include_tiles: bool,
}

/// Response for asset listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListAssetsResponse {
    pub data: Vec<Asset>,
    pub count: usize,
}
