// Short-link registry: create, list, and resolve slugs.
//
// Resolution sits on the hot redirect path, so resolved rows are cached in
// Redis. The cache is an optimization only; every miss or Redis failure falls
// through to Postgres.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{DieselPool, RedisPool};
use crate::models::{CreateShortLinkRequest, NewShortLink, ShortLink, ShortLinkResponse};
use crate::schema::qr_codes;
use crate::utils::ServiceError;

/// Resolved links stay cached this long
const CACHE_TTL_SECS: u64 = 3600;

const CACHE_PREFIX: &str = "cardlink:slug:";

fn cache_key(slug: &str) -> String {
    format!("{}{}", CACHE_PREFIX, slug)
}

#[derive(Clone)]
pub struct ShortLinkService {
    diesel_pool: DieselPool,
    redis_pool: RedisPool,
    base_url: String,
}

impl ShortLinkService {
    pub fn new(diesel_pool: DieselPool, redis_pool: RedisPool, base_url: String) -> Self {
        Self {
            diesel_pool,
            redis_pool,
            base_url,
        }
    }

    /// All registered links, newest first
    pub async fn list(&self) -> Result<Vec<ShortLinkResponse>, ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let links: Vec<ShortLink> = qr_codes::table
            .order(qr_codes::created_at.desc())
            .select(ShortLink::as_select())
            .load(&mut conn)
            .await?;

        Ok(links
            .iter()
            .map(|link| link.to_response(&self.base_url))
            .collect())
    }

    /// Register a new slug. Input is normalized before validation; a duplicate
    /// slug surfaces as a conflict.
    pub async fn create(
        &self,
        mut request: CreateShortLinkRequest,
    ) -> Result<ShortLinkResponse, ServiceError> {
        request.sanitize();
        request.validate()?;

        let new_link = NewShortLink {
            id: Uuid::new_v4(),
            slug: request.slug,
            redirect_url: request.redirect_url,
            title: request.title,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let link: ShortLink = diesel::insert_into(qr_codes::table)
            .values(&new_link)
            .get_result(&mut conn)
            .await?;

        info!(slug = %link.slug, "Short link created");
        self.cache_link(&link).await;

        Ok(link.to_response(&self.base_url))
    }

    /// Resolve a slug to its active link. Inactive and unknown slugs are both
    /// reported as not found; callers cannot tell them apart.
    pub async fn resolve_active(&self, slug: &str) -> Result<ShortLink, ServiceError> {
        if let Some(link) = self.cached_link(slug).await {
            if link.is_active {
                return Ok(link);
            }
            return Err(ServiceError::NotFound);
        }

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let link: ShortLink = qr_codes::table
            .filter(qr_codes::slug.eq(slug))
            .filter(qr_codes::is_active.eq(true))
            .select(ShortLink::as_select())
            .first(&mut conn)
            .await?;

        self.cache_link(&link).await;
        Ok(link)
    }

    async fn cached_link(&self, slug: &str) -> Option<ShortLink> {
        let mut conn = self.redis_pool.manager();
        match conn.get::<_, Option<String>>(cache_key(slug)).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(link) => {
                    debug!(slug = %slug, "Slug cache hit");
                    Some(link)
                }
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Dropping unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(slug = %slug, error = %e, "Slug cache unavailable");
                None
            }
        }
    }

    /// Best effort; a failed cache write never fails the request
    async fn cache_link(&self, link: &ShortLink) {
        let json = match serde_json::to_string(link) {
            Ok(json) => json,
            Err(e) => {
                warn!(slug = %link.slug, error = %e, "Could not serialize link for cache");
                return;
            }
        };

        let mut conn = self.redis_pool.manager();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(cache_key(&link.slug), json, CACHE_TTL_SECS)
            .await
        {
            debug!(slug = %link.slug, error = %e, "Slug cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_namespaced_per_slug() {
        assert_eq!(cache_key("demo"), "cardlink:slug:demo");
        assert_ne!(cache_key("a"), cache_key("b"));
    }
}
