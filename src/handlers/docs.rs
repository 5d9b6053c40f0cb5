// OpenAPI document for the admin surface

use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::db::RedisHealth;
use crate::handlers;
use crate::models::qr::{QrConfigUpdate, QrConfigView, QrErrorLevel, QrStyle};
use crate::models::{CreateShortLinkRequest, Scan, ShortLinkResponse};
use crate::services::analytics::{AnalyticsSnapshot, DayBucket, DeviceBreakdown};
use crate::services::background_tasks::TaskStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cardlink API",
        description = "Short links, styled QR codes, scan analytics, and a contact card"
    ),
    paths(
        handlers::health::health_check,
        handlers::vcard::download_vcard,
        handlers::admin::login,
        handlers::links::create_link,
        handlers::links::list_links,
        handlers::qr::get_config,
        handlers::qr::update_config,
        handlers::qr::set_target,
        handlers::qr::upload_logo,
        handlers::qr::clear_logo,
        handlers::qr::export_png,
        handlers::qr::export_svg,
        handlers::analytics::get_analytics,
    ),
    components(schemas(
        CreateShortLinkRequest,
        ShortLinkResponse,
        QrConfigUpdate,
        QrConfigView,
        QrStyle,
        QrErrorLevel,
        AnalyticsSnapshot,
        DeviceBreakdown,
        DayBucket,
        Scan,
        TaskStatus,
        RedisHealth,
        handlers::admin::LoginRequest,
        handlers::admin::LoginResponse,
        handlers::health::HealthReport,
        handlers::health::ComponentHealth,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Card", description = "Public contact card"),
        (name = "Links", description = "Short-link registry"),
        (name = "QR", description = "QR configuration and export"),
        (name = "Analytics", description = "Scan analytics"),
        (name = "Admin", description = "Session management"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

/// Serve the generated document
/// GET /api/v1/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
