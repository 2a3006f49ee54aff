//! Authentication middleware.
//!
//! Admin routes require the configured admin key; device routes require the
//! key of a registered screen. Both arrive in `X-API-Key`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::constant_time_eq;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::screen_key::{ScreenAuth, API_KEY_HEADER};

fn header_key(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

fn is_admin_key(presented: &str, configured: &str) -> bool {
    !configured.is_empty() && constant_time_eq(presented.as_bytes(), configured.as_bytes())
}

/// Requires the admin API key.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(api_key) = header_key(&req) else {
        return ApiError::Unauthorized("Invalid or missing API key".to_string()).into_response();
    };

    if !is_admin_key(api_key, &state.config.security.admin_api_key) {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request with wrong key");
        return ApiError::Unauthorized("Invalid or missing API key".to_string()).into_response();
    }

    next.run(req).await
}

/// Requires a screen API key and stores the authenticated [`ScreenAuth`] in
/// request extensions for rate limiting and handlers.
pub async fn require_screen_key(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let api_key = match header_key(&req) {
        Some(key) => key.to_string(),
        None => {
            return ApiError::Unauthorized("Invalid or missing API key".to_string())
                .into_response()
        }
    };

    match ScreenAuth::validate(&state.pool, &api_key).await {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
