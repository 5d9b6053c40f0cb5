// Public contact-card download

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::{app::AppState, services::vcard::Language};

#[derive(Debug, Deserialize)]
pub struct VCardParams {
    /// `en` or `tr`; anything else falls back to English
    pub lang: Option<String>,
}

/// Download the contact card
/// GET /vcard.vcf
#[utoipa::path(
    get,
    path = "/vcard.vcf",
    tag = "Card",
    operation_id = "downloadVCard",
    params(("lang" = Option<String>, Query, description = "Card language, en or tr")),
    responses(
        (status = 200, description = "vCard 3.0 document")
    )
)]
pub async fn download_vcard(
    State(state): State<AppState>,
    Query(params): Query<VCardParams>,
) -> impl IntoResponse {
    let lang = Language::from_query(params.lang.as_deref());
    let card = state.vcard.render(lang).await;
    let filename = state.vcard.filename();

    info!(lang = ?lang, filename = %filename, "vCard downloaded");
    (
        [
            (
                header::CONTENT_TYPE,
                "text/vcard; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        card,
    )
}
