// Library exports for Cardlink
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::{build_router, AppState};
pub use app_config::{AppConfig, ContactProfile, CONFIG};
pub use db::{DieselPool, RedisPool};
pub use models::{CreateShortLinkRequest, DeviceType, Scan, ShortLink, ShortLinkResponse};
pub use services::{
    AnalyticsService, QrService, ScanTrackingService, ShortLinkService, TaskTracker, VCardService,
};
pub use utils::ServiceError;

// Re-export handler route builders
pub use handlers::{admin_routes, public_routes};

/// Initialize pools, run migrations, and build the shared state.
/// This is the whole startup sequence short of binding the listener.
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    use std::sync::Arc;
    use tracing::info;

    // Load environment
    dotenv::dotenv().ok();

    let config = app_config::config();

    // Initialize database pool
    info!("Initializing database pool...");
    let diesel_pool = db::create_diesel_pool(
        &config.database_url,
        config.database_max_connections,
        std::time::Duration::from_secs(config.database_connect_timeout),
    )
    .await?;

    // Run migrations if enabled
    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        migrations::run_migrations(&config.database_url)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    // Initialize Redis pool
    info!("Initializing Redis pool...");
    let redis_pool = RedisPool::new(&config.redis_url).await?;

    Ok(AppState::new(
        Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
    ))
}
