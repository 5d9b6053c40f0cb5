pub mod admin;
pub mod analytics;
pub mod docs;
pub mod health;
pub mod links;
pub mod qr;
pub mod redirect;
pub mod vcard;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::app::AppState;

/// Routes reachable without a session: the tracked redirect, the card
/// download, health, docs, and login
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/vcard.vcf", get(vcard::download_vcard))
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/openapi.json", get(docs::openapi_json))
        .route("/api/v1/admin/login", post(admin::login))
        // Last so it cannot shadow the fixed routes above
        .route("/{slug}", get(redirect::redirect_to_target))
}

/// Token-gated admin surface; the session middleware wraps the whole set
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/links", post(links::create_link))
        .route("/api/v1/links", get(links::list_links))
        .route("/api/v1/qr/config", get(qr::get_config))
        .route("/api/v1/qr/config", put(qr::update_config))
        .route("/api/v1/qr/target/{slug}", put(qr::set_target))
        .route("/api/v1/qr/logo", post(qr::upload_logo))
        .route("/api/v1/qr/logo", delete(qr::clear_logo))
        .route("/api/v1/qr/export.png", get(qr::export_png))
        .route("/api/v1/qr/export.svg", get(qr::export_svg))
        .route("/api/v1/analytics", get(analytics::get_analytics))
}
