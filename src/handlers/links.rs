// Admin short-link registry endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

use crate::{
    app::AppState,
    models::{CreateShortLinkRequest, ShortLinkResponse},
};

// =============================================================================
// LINK HANDLERS
// =============================================================================

/// Register a new short link
/// POST /api/v1/links
#[utoipa::path(
    post,
    path = "/api/v1/links",
    tag = "Links",
    operation_id = "createLink",
    request_body = CreateShortLinkRequest,
    responses(
        (status = 201, description = "Link created", body = ShortLinkResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 409, description = "Slug already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_link(
    State(state): State<AppState>,
    Json(request): Json<CreateShortLinkRequest>,
) -> impl IntoResponse {
    match state.short_links.create(request).await {
        Ok(link) => {
            // A freshly created link becomes the QR target right away, same as
            // picking it in the admin screen
            state
                .qr
                .select_target(&link.slug, link.short_url.clone())
                .await;
            (StatusCode::CREATED, Json(link)).into_response()
        },
        Err(e) => e.into_response(),
    }
}

/// List registered links, newest first
/// GET /api/v1/links
#[utoipa::path(
    get,
    path = "/api/v1/links",
    tag = "Links",
    operation_id = "listLinks",
    responses(
        (status = 200, description = "All registered links", body = [ShortLinkResponse]),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_links(State(state): State<AppState>) -> impl IntoResponse {
    match state.short_links.list().await {
        Ok(links) => Json(links),
        Err(e) => {
            // The admin screen treats a failed load as an empty list
            warn!(error = %e, "Listing links failed");
            Json(Vec::new())
        },
    }
}
