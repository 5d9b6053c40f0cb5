// Application state and router assembly
use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    app_config::AppConfig,
    db::{DieselPool, RedisPool},
    handlers,
    middleware::admin_auth,
    services::{
        AnalyticsService, QrService, ScanTrackingService, ShortLinkService, TaskTracker,
        VCardService,
    },
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub short_links: Arc<ShortLinkService>,
    pub scan_tracking: Arc<ScanTrackingService>,
    pub analytics: Arc<AnalyticsService>,
    pub qr: Arc<QrService>,
    pub vcard: Arc<VCardService>,
}

impl AppState {
    /// Wire every service off the shared pools
    pub fn new(config: Arc<AppConfig>, diesel_pool: DieselPool, redis_pool: RedisPool) -> Self {
        let short_links = Arc::new(ShortLinkService::new(
            diesel_pool.clone(),
            redis_pool.clone(),
            config.public_base_url.clone(),
        ));

        let scan_tracking = Arc::new(ScanTrackingService::new(
            diesel_pool.clone(),
            redis_pool.clone(),
            short_links.clone(),
            TaskTracker::new(),
            config.default_country.clone(),
        ));

        let analytics = Arc::new(AnalyticsService::new(
            diesel_pool.clone(),
            config.default_slug.clone(),
        ));

        let default_target = format!(
            "{}/{}",
            config.public_base_url.trim_end_matches('/'),
            config.default_slug
        );
        let qr = Arc::new(QrService::new(default_target));

        let vcard = Arc::new(VCardService::new(config.contact.clone()));

        Self {
            config,
            diesel_pool,
            redis_pool,
            short_links,
            scan_tracking,
            analytics,
            qr,
            vcard,
        }
    }
}

/// Full application router: public surface plus the token-gated admin surface
pub fn build_router(state: AppState) -> Router {
    let admin = handlers::admin_routes().layer(axum_middleware::from_fn_with_state(
        state.clone(),
        admin_auth::require_admin,
    ));

    Router::new()
        .merge(handlers::public_routes())
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
