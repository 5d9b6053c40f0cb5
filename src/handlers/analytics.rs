// Admin analytics endpoint

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{app::AppState, services::analytics::AnalyticsSnapshot};

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    /// Slug to report on; defaults to the configured card slug
    pub slug: Option<String>,
}

/// Scan analytics snapshot
/// GET /api/v1/analytics
#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    tag = "Analytics",
    operation_id = "getAnalytics",
    params(("slug" = Option<String>, Query, description = "Slug to report on")),
    responses(
        (status = 200, description = "Analytics snapshot", body = AnalyticsSnapshot),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Slug unknown")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> impl IntoResponse {
    match state.analytics.snapshot(params.slug.as_deref()).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}
