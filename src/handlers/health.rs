// Service health: store connectivity plus background recording outcomes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    app::AppState,
    db::{check_diesel_health, RedisHealth},
    services::background_tasks::TaskStatus,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: ComponentHealth,
    pub redis: RedisHealth,
    /// Fire-and-forget scan recording outcomes since startup
    pub scan_recording: TaskStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub is_healthy: bool,
    pub error: Option<String>,
}

/// Health report
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    operation_id = "healthCheck",
    responses(
        (status = 200, description = "All components healthy", body = HealthReport),
        (status = 503, description = "A component is down", body = HealthReport)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match check_diesel_health(&state.diesel_pool).await {
        Ok(()) => ComponentHealth {
            is_healthy: true,
            error: None,
        },
        Err(e) => ComponentHealth {
            is_healthy: false,
            error: Some(e.to_string()),
        },
    };

    let redis = state.redis_pool.health_check().await;

    let healthy = database.is_healthy && redis.is_healthy;
    let report = HealthReport {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.to_string(),
        database,
        redis,
        scan_recording: state.scan_tracking.tracker().status(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}
