//! Screen registry routes (admin).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::screen::{
    CreateScreenRequest, ScreenOverview, ScreenWithKeyResponse, UpdateScreenRequest,
};
use domain::models::Screen;
use persistence::repositories::{NewScreen, ScreenRepository};
use serde::Serialize;
use shared::crypto::{display_prefix, generate_api_key, redact_api_key, sha256_hex};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::SuccessResponse;

/// Response for screen listing.
#[derive(Debug, Serialize)]
pub struct ListScreensResponse {
    pub data: Vec<ScreenOverview>,
    pub count: usize,
}

/// List all screens, newest first.
///
/// GET /api/v1/admin/screens
pub async fn list_screens(
    State(state): State<AppState>,
) -> Result<Json<ListScreensResponse>, ApiError> {
    let repo = ScreenRepository::new(state.pool.clone());
    let data: Vec<ScreenOverview> = repo
        .list_overview()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(ListScreensResponse { data, count }))
}

/// Register a screen and issue its API key.
///
/// POST /api/v1/admin/screens
///
/// The plaintext key is returned once; only its hash is stored.
pub async fn create_screen(
    State(state): State<AppState>,
    Json(request): Json<CreateScreenRequest>,
) -> Result<(StatusCode, Json<ScreenWithKeyResponse>), ApiError> {
    request.validate()?;

    let api_key = generate_api_key();
    let key_hash = sha256_hex(&api_key);
    let repo = ScreenRepository::new(state.pool.clone());
    let screen = repo
        .create(NewScreen {
            screen_id: &request.screen_id,
            name: request.name.trim(),
            location: request.location.as_deref(),
            resolution: &request.resolution,
            refresh_interval: request.refresh_interval,
            api_key_hash: &key_hash,
            api_key_prefix: display_prefix(&api_key),
        })
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict(format!(
                "Screen '{}' already exists",
                request.screen_id
            )),
            other => other,
        })?;

    info!(
        screen_id = %screen.screen_id,
        api_key = %redact_api_key(&api_key),
        "Screen registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(ScreenWithKeyResponse {
            screen: screen.into(),
            api_key,
        }),
    ))
}

/// GET /api/v1/admin/screens/:screen_id
pub async fn get_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<Screen>, ApiError> {
    let repo = ScreenRepository::new(state.pool.clone());
    let screen = repo
        .find_by_screen_id(&screen_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Screen not found".to_string()))?;

    Ok(Json(screen.into()))
}

/// PUT /api/v1/admin/screens/:screen_id
pub async fn update_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
    Json(request): Json<UpdateScreenRequest>,
) -> Result<Json<Screen>, ApiError> {
    request.validate()?;

    let repo = ScreenRepository::new(state.pool.clone());
    let screen = repo
        .update(
            &screen_id,
            request.name.trim(),
            request.location.as_deref(),
            &request.resolution,
            request.refresh_interval,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Screen not found".to_string()))?;

    info!(screen_id = %screen_id, "Screen updated");
    Ok(Json(screen.into()))
}

/// Delete a screen. Its playlist, heartbeats and group membership go with
/// it. Deleting an unknown screen succeeds.
///
/// DELETE /api/v1/admin/screens/:screen_id
pub async fn delete_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let repo = ScreenRepository::new(state.pool.clone());
    let deleted = repo.delete(&screen_id).await?;

    if deleted > 0 {
        info!(screen_id = %screen_id, "Screen deleted");
    }
    Ok(Json(SuccessResponse::ok()))
}

/// Replace a screen's API key. The old key stops working immediately.
///
/// POST /api/v1/admin/screens/:screen_id/regenerate-key
pub async fn regenerate_key(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<ScreenWithKeyResponse>, ApiError> {
    let api_key = generate_api_key();
    let repo = ScreenRepository::new(state.pool.clone());
    let screen = repo
        .rotate_key(&screen_id, &sha256_hex(&api_key), display_prefix(&api_key))
        .await?
        .ok_or_else(|| ApiError::NotFound("Screen not found".to_string()))?;

    info!(
        screen_id = %screen_id,
        api_key = %redact_api_key(&api_key),
        "Screen API key regenerated"
    );

    Ok(Json(ScreenWithKeyResponse {
        screen: screen.into(),
        api_key,
    }))
}
