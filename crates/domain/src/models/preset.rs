//! Preset playlist domain model.
//!
//! A preset is a named, ordered list of assets that operators maintain once
//! and copy onto any number of screens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_identifier, validate_not_blank};
use validator::{Validate, ValidationError};

use super::asset::AssetType;

/// A named playlist template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: i64,
    pub preset_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetItem {
    pub id: i64,
    pub preset_id: String,
    pub asset_id: String,
    pub duration: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Preset entry joined with its asset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetItemDetail {
    #[serde(flatten)]
    pub item: PresetItem,
    pub filename: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub url: String,
    pub size: i64,
}

/// Preset with its entries in play order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDetail {
    #[serde(flatten)]
    pub preset: Preset,
    pub item_count: usize,
    pub total_duration: i64,
    pub items: Vec<PresetItemDetail>,
}

impl PresetDetail {
    pub fn new(preset: Preset, items: Vec<PresetItemDetail>) -> Self {
        Self {
            item_count: items.len(),
            total_duration: items.iter().map(|i| i.item.duration as i64).sum(),
            preset,
            items,
        }
    }
}

/// Request payload for creating a preset.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePresetRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

fn validate_screen_ids(screen_ids: &[String]) -> Result<(), ValidationError> {
    for screen_id in screen_ids {
        validate_identifier(screen_id)?;
    }
    let mut sorted: Vec<&String> = screen_ids.iter().collect();
    sorted.sort();
    sorted.dedup();
    if sorted.len() != screen_ids.len() {
        let mut err = ValidationError::new("duplicate_screen_id");
        err.message = Some("Each screen may be listed once".into());
        return Err(err);
    }
    Ok(())
}

/// Request payload for copying a preset onto screens.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyPresetRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 screens required"))]
    #[validate(custom(function = "validate_screen_ids"))]
    pub screen_ids: Vec<String>,
}

/// Result of applying a preset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPresetResponse {
    pub success: bool,
    pub message: String,
    pub screens_updated: usize,
    pub items_per_screen: usize,
}

impl ApplyPresetResponse {
    pub fn new(screens_updated: usize, items_per_screen: usize) -> Self {
        Self {
            success: true,
            message: format!("Preset applied to {} screen(s)", screens_updated),
            screens_updated,
            items_per_screen,
        }
    }
}

/// Response for preset listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListPresetsResponse {
    pub data: Vec<PresetDetail>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn preset() -> Preset {
        Preset {
            id: 1,
            preset_id: "preset-1".to_string(),
            name: "Breakfast menu".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(position: i32, duration: i32) -> PresetItemDetail {
        PresetItemDetail {
            item: PresetItem {
                id: position as i64,
                preset_id: "preset-1".to_string(),
                asset_id: format!("asset-{}", position),
                duration,
                position,
                created_at: Utc::now(),
            },
            filename: "menu.png".to_string(),
            asset_type: AssetType::Image,
            url: "http://blobs/menu.png".to_string(),
            size: 10,
        }
    }

    #[test]
    fn test_detail_totals() {
        let detail = PresetDetail::new(preset(), vec![item(1, 10), item(2, 25)]);
        assert_eq!(detail.item_count, 2);
        assert_eq!(detail.total_duration, 35);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["presetId"], "preset-1");
        assert_eq!(json["itemCount"], 2);
        assert_eq!(json["items"][1]["type"], "image");
        assert_eq!(json["items"][1]["position"], 2);
    }

    #[test]
    fn test_apply_request_needs_screens() {
        let req: ApplyPresetRequest = serde_json::from_value(json!({"screenIds": []})).unwrap();
        assert!(req.validate().is_err());

        let req: ApplyPresetRequest =
            serde_json::from_value(json!({"screenIds": ["lobby-1", "lobby-2"]})).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_apply_request_rejects_repeats_and_bad_ids() {
        let req: ApplyPresetRequest =
            serde_json::from_value(json!({"screenIds": ["lobby-1", "lobby-1"]})).unwrap();
        assert!(req.validate().is_err());

        let req: ApplyPresetRequest =
            serde_json::from_value(json!({"screenIds": ["../etc"]})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_apply_response_message() {
        let response = ApplyPresetResponse::new(3, 4);
        assert!(response.success);
        assert_eq!(response.message, "Preset applied to 3 screen(s)");
    }
}
