//! Screen API key authentication extractor.
//!
//! Device routes carry the screen's own key in `X-API-Key`. A key
//! authenticates exactly one screen.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use persistence::repositories::ScreenRepository;
use shared::crypto::{sha256_hex, API_KEY_PREFIX};
use sqlx::PgPool;

use crate::app::AppState;
use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// The screen a request authenticated as.
#[derive(Debug, Clone)]
pub struct ScreenAuth {
    pub screen_id: String,
    pub key_prefix: Option<String>,
}

impl ScreenAuth {
    /// Looks the key up by its SHA-256 hash.
    pub async fn validate(pool: &PgPool, api_key: &str) -> Result<Self, ApiError> {
        if api_key.len() <= API_KEY_PREFIX.len() || !api_key.starts_with(API_KEY_PREFIX) {
            return Err(invalid_key());
        }

        let repo = ScreenRepository::new(pool.clone());
        let screen = repo
            .find_by_key_hash(&sha256_hex(api_key))
            .await
            .map_err(|e| {
                tracing::error!("Database error during API key lookup: {}", e);
                ApiError::Internal("Authentication service unavailable".to_string())
            })?
            .ok_or_else(invalid_key)?;

        Ok(ScreenAuth {
            screen_id: screen.screen_id,
            key_prefix: Some(screen.api_key_prefix),
        })
    }

    /// Rejects access to any screen other than the authenticated one.
    pub fn authorize(&self, screen_id: &str) -> Result<(), ApiError> {
        if self.screen_id == screen_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "API key does not belong to this screen".to_string(),
            ))
        }
    }
}

fn invalid_key() -> ApiError {
    ApiError::Unauthorized("Invalid or missing API key".to_string())
}

pub(crate) fn api_key_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for ScreenAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by the device auth middleware
        if let Some(auth) = parts.extensions.get::<ScreenAuth>() {
            return Ok(auth.clone());
        }

        let api_key = api_key_from_parts(parts).ok_or_else(invalid_key)?;
        Self::validate(&state.pool, api_key).await
    }
}
