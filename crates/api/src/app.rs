use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::{BlobStore, GroupContentService};
use persistence::repositories::PgContentStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_screen_key,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    assets, device, group_content, health, presets, screen_groups, screen_playlists, screens,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub content: GroupContentService,
    pub blobs: Arc<dyn BlobStore>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool, blobs: Arc<dyn BlobStore>) -> Router {
    let config = Arc::new(config);

    // None when rate_limit_per_minute is 0
    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let content = GroupContentService::new(
        Arc::new(PgContentStore::new(pool.clone())),
        blobs.clone(),
        (&config.content).into(),
    );

    let state = AppState {
        pool,
        config: config.clone(),
        content,
        blobs,
        rate_limiter,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Device routes: each screen authenticates with its own key.
    // Middleware order: screen key auth runs first, then per-screen rate limiting.
    let device_routes = Router::new()
        .route(
            "/api/v1/screens/:screen_id/config",
            get(device::get_config),
        )
        .route(
            "/api/v1/screens/:screen_id/playlist",
            get(device::get_playlist),
        )
        .route(
            "/api/v1/screens/:screen_id/heartbeat",
            get(device::get_heartbeat).post(device::post_heartbeat),
        )
        .route("/api/v1/assets/:asset_id", get(device::get_asset))
        .route(
            "/api/v1/assets/:asset_id/download",
            get(device::download_asset),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_screen_key,
        ));

    // Admin routes (require the admin API key)
    let admin_routes = Router::new()
        // Screens
        .route(
            "/api/v1/admin/screens",
            get(screens::list_screens).post(screens::create_screen),
        )
        .route(
            "/api/v1/admin/screens/:screen_id",
            get(screens::get_screen)
                .put(screens::update_screen)
                .delete(screens::delete_screen),
        )
        .route(
            "/api/v1/admin/screens/:screen_id/regenerate-key",
            post(screens::regenerate_key),
        )
        // Screen playlists
        .route(
            "/api/v1/admin/screens/:screen_id/playlist",
            get(screen_playlists::get_playlist).post(screen_playlists::add_item),
        )
        .route(
            "/api/v1/admin/screens/:screen_id/playlist/clear",
            post(screen_playlists::clear_playlist),
        )
        .route(
            "/api/v1/admin/screens/:screen_id/playlist/:item_id",
            put(screen_playlists::update_item).delete(screen_playlists::delete_item),
        )
        // Assets
        .route(
            "/api/v1/admin/assets",
            get(assets::list_assets).post(assets::upload_asset),
        )
        .route(
            "/api/v1/admin/assets/:asset_id",
            delete(assets::delete_asset),
        )
        // Screen groups
        .route(
            "/api/v1/admin/screen-groups",
            get(screen_groups::list_groups).post(screen_groups::create_group),
        )
        .route(
            "/api/v1/admin/screen-groups/:group_id",
            get(screen_groups::get_group)
                .put(screen_groups::update_group)
                .delete(screen_groups::delete_group),
        )
        .route(
            "/api/v1/admin/screen-groups/:group_id/members",
            get(screen_groups::list_members).post(screen_groups::assign_member),
        )
        .route(
            "/api/v1/admin/screen-groups/:group_id/members/:screen_id",
            delete(screen_groups::unassign_member),
        )
        // Group content
        .route(
            "/api/v1/admin/screen-groups/:group_id/content",
            get(group_content::list_content)
                .post(group_content::assign_content)
                .put(group_content::update_content_duration)
                .delete(group_content::remove_content),
        )
        .route(
            "/api/v1/admin/screen-groups/:group_id/content/:item_id",
            put(group_content::update_content),
        )
        // Presets
        .route(
            "/api/v1/admin/presets",
            get(presets::list_presets).post(presets::create_preset),
        )
        .route(
            "/api/v1/admin/presets/:preset_id",
            get(presets::get_preset).delete(presets::delete_preset),
        )
        .route(
            "/api/v1/admin/presets/:preset_id/items",
            get(presets::list_items).post(presets::add_item),
        )
        .route(
            "/api/v1/admin/presets/:preset_id/items/:item_id",
            put(presets::update_item).delete(presets::delete_item),
        )
        .route(
            "/api/v1/admin/presets/:preset_id/apply",
            post(presets::apply_preset),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(device_routes)
        .merge(admin_routes);

    // Local blobs are published by this server
    if config.blob.provider == "local" {
        router = router.nest_service("/blobs", ServeDir::new(&config.blob.local_dir));
    }

    router
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
