//! Heartbeat domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A liveness report sent by a screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub id: i64,
    pub screen_id: String,
    pub status: String,
    pub current_asset: Option<String>,
    pub uptime: Option<i64>,
    pub temperature: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Heartbeat payload posted by a device.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeartbeatRequest {
    #[validate(length(min = 1, max = 20, message = "Status must be between 1 and 20 characters"))]
    pub status: Option<String>,

    #[validate(length(max = 100, message = "Current asset must be at most 100 characters"))]
    pub current_asset: Option<String>,

    #[validate(range(min = 0, message = "Uptime must not be negative"))]
    pub uptime: Option<i64>,

    #[validate(range(min = -100.0, max = 200.0, message = "Temperature out of range"))]
    pub temperature: Option<f64>,
}

impl HeartbeatRequest {
    pub fn status_or_default(&self) -> &str {
        self.status.as_deref().unwrap_or("online")
    }
}

/// Acknowledgement returned for a heartbeat.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatAck {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_defaults_to_online() {
        let req: HeartbeatRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.status_or_default(), "online");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_heartbeat_request_fields() {
        let req: HeartbeatRequest = serde_json::from_value(json!({
            "status": "playing",
            "currentAsset": "tile-1",
            "uptime": 3600,
            "temperature": 48.5
        }))
        .unwrap();
        assert_eq!(req.status_or_default(), "playing");
        assert_eq!(req.uptime, Some(3600));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_heartbeat_request_rejects_negative_uptime() {
        let req: HeartbeatRequest = serde_json::from_value(json!({"uptime": -5})).unwrap();
        assert!(req.validate().is_err());
    }
}
