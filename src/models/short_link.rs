// Short-link records: slug -> redirect URL, the thing a QR code encodes

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::qr_codes;

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Short-link record as stored in `qr_codes`
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = qr_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShortLink {
    pub id: Uuid,
    pub slug: String,
    pub redirect_url: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// New short link for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = qr_codes)]
pub struct NewShortLink {
    pub id: Uuid,
    pub slug: String,
    pub redirect_url: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").unwrap();
}

/// Request to create a new short link
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateShortLinkRequest {
    #[validate(length(min = 1, max = 64, message = "Slug must be 1-64 characters"))]
    #[validate(regex(
        path = "SLUG_REGEX",
        message = "Slug can only contain lowercase letters, numbers, and hyphens"
    ))]
    pub slug: String,

    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 2048, message = "URL must be less than 2048 characters"))]
    pub redirect_url: String,

    #[validate(length(max = 200, message = "Title must be less than 200 characters"))]
    pub title: Option<String>,
}

impl CreateShortLinkRequest {
    /// Normalize input before validation. Slug format is an input-layer
    /// restriction, not a domain rule: lowercase, spaces to hyphens, anything
    /// else outside [a-z0-9-] dropped.
    pub fn sanitize(&mut self) {
        self.slug = normalize_slug(&self.slug);
        self.redirect_url = self.redirect_url.trim().to_string();
        self.title = self
            .title
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }
}

/// Lowercase a typed slug and keep only alphanumerics and hyphens
pub fn normalize_slug(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Short link response for the admin API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    pub id: Uuid,
    pub slug: String,
    pub redirect_url: String,
    pub title: String,
    pub short_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Display label, defaulting to the slug when no title was given
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }

    /// The shareable URL this record is reachable under
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.slug)
    }

    pub fn to_response(&self, base_url: &str) -> ShortLinkResponse {
        ShortLinkResponse {
            id: self.id,
            slug: self.slug.clone(),
            redirect_url: self.redirect_url.clone(),
            title: self.display_title().to_string(),
            short_url: self.short_url(base_url),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
