// Admin QR configuration and export endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    app::AppState,
    models::qr::{QrConfigUpdate, QrConfigView},
    services::qr::ExportFormat,
};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Current render configuration
/// GET /api/v1/qr/config
#[utoipa::path(
    get,
    path = "/api/v1/qr/config",
    tag = "QR",
    operation_id = "getQrConfig",
    responses(
        (status = 200, description = "Current configuration", body = QrConfigView),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.qr.current().await)
}

/// Merge a partial configuration update
/// PUT /api/v1/qr/config
#[utoipa::path(
    put,
    path = "/api/v1/qr/config",
    tag = "QR",
    operation_id = "updateQrConfig",
    request_body = QrConfigUpdate,
    responses(
        (status = 200, description = "Updated configuration", body = QrConfigView),
        (status = 400, description = "Unsupported size or malformed color"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<QrConfigUpdate>,
) -> impl IntoResponse {
    match state.qr.apply(update).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Point the QR code at a registered short link
/// PUT /api/v1/qr/target/{slug}
#[utoipa::path(
    put,
    path = "/api/v1/qr/target/{slug}",
    tag = "QR",
    operation_id = "setQrTarget",
    params(("slug" = String, Path, description = "Slug of the link to encode")),
    responses(
        (status = 200, description = "Updated configuration", body = QrConfigView),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Slug unknown or inactive")
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_target(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.short_links.resolve_active(&slug).await {
        Ok(link) => {
            let short_url = link.short_url(&state.config.public_base_url);
            state.qr.select_target(&link.slug, short_url).await;
            Json(state.qr.current().await).into_response()
        },
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// LOGO
// =============================================================================

/// Upload a center logo. Payloads that do not decode as an image are ignored.
/// POST /api/v1/qr/logo
#[utoipa::path(
    post,
    path = "/api/v1/qr/logo",
    tag = "QR",
    operation_id = "uploadQrLogo",
    responses(
        (status = 204, description = "Logo accepted, or payload silently ignored"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_logo(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    if !state.qr.set_logo(&body).await {
        info!(bytes = body.len(), "Ignored logo upload that did not decode");
    }
    StatusCode::NO_CONTENT
}

/// Remove the logo
/// DELETE /api/v1/qr/logo
#[utoipa::path(
    delete,
    path = "/api/v1/qr/logo",
    tag = "QR",
    operation_id = "clearQrLogo",
    responses(
        (status = 204, description = "Logo removed; removing an absent logo is not an error"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn clear_logo(State(state): State<AppState>) -> impl IntoResponse {
    state.qr.clear_logo().await;
    StatusCode::NO_CONTENT
}

// =============================================================================
// EXPORT
// =============================================================================

/// Download the current code as PNG
/// GET /api/v1/qr/export.png
#[utoipa::path(
    get,
    path = "/api/v1/qr/export.png",
    tag = "QR",
    operation_id = "exportQrPng",
    responses(
        (status = 200, description = "PNG artifact"),
        (status = 400, description = "Current configuration cannot be rendered"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn export_png(State(state): State<AppState>) -> impl IntoResponse {
    export(state, ExportFormat::Png).await
}

/// Download the current code as SVG
/// GET /api/v1/qr/export.svg
#[utoipa::path(
    get,
    path = "/api/v1/qr/export.svg",
    tag = "QR",
    operation_id = "exportQrSvg",
    responses(
        (status = 200, description = "SVG artifact"),
        (status = 400, description = "Current configuration cannot be rendered"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn export_svg(State(state): State<AppState>) -> impl IntoResponse {
    export(state, ExportFormat::Svg).await
}

async fn export(state: AppState, format: ExportFormat) -> axum::response::Response {
    match state.qr.export(format).await {
        Ok(artifact) => {
            info!(filename = %artifact.filename, bytes = artifact.bytes.len(), "QR exported");
            (
                [
                    (header::CONTENT_TYPE, artifact.content_type.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", artifact.filename),
                    ),
                ],
                artifact.bytes,
            )
                .into_response()
        },
        Err(e) => e.into_response(),
    }
}
