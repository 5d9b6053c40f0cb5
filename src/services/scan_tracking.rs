// Fire-and-forget scan recording.
//
// The redirect handler must never wait on analytics writes: recording runs in
// a spawned task, and every outcome lands in the shared task tracker so the
// health endpoint can report drops.

use chrono::Utc;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use woothee::parser::Parser;

use crate::db::{DieselPool, RedisPool};
use crate::models::{DeviceType, NewScan};
use crate::schema::scans;
use crate::services::background_tasks::TaskTracker;
use crate::services::short_link::ShortLinkService;
use crate::utils::ServiceError;

#[derive(Clone)]
pub struct ScanTrackingService {
    diesel_pool: DieselPool,
    redis_pool: RedisPool,
    short_links: Arc<ShortLinkService>,
    tracker: TaskTracker,
    default_country: String,
}

impl ScanTrackingService {
    pub fn new(
        diesel_pool: DieselPool,
        redis_pool: RedisPool,
        short_links: Arc<ShortLinkService>,
        tracker: TaskTracker,
        default_country: String,
    ) -> Self {
        Self {
            diesel_pool,
            redis_pool,
            short_links,
            tracker,
            default_country,
        }
    }

    /// Outcome counters for the health report
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Record a visit without blocking the caller. The redirect has already
    /// been decided; this only feeds analytics.
    pub fn record_scan(
        &self,
        slug: String,
        user_agent: Option<String>,
        country_header: Option<String>,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            match service.record(&slug, user_agent, country_header).await {
                Ok(()) => service.tracker.record_success(),
                // The slug vanished between redirect and record; nothing to write
                Err(ServiceError::NotFound) => {
                    debug!(slug = %slug, "Slug gone before recording, skipped")
                },
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Scan recording failed");
                    service.tracker.record_failure(e.to_string());
                },
            }
        });
    }

    async fn record(
        &self,
        slug: &str,
        user_agent: Option<String>,
        country_header: Option<String>,
    ) -> Result<(), ServiceError> {
        let link = self.short_links.resolve_active(slug).await?;

        let user_agent = user_agent.unwrap_or_default();
        let device_type = DeviceType::from_user_agent(&user_agent);

        if let Some(parsed) = Parser::new().parse(&user_agent) {
            debug!(
                slug = %slug,
                browser = parsed.name,
                os = parsed.os,
                category = parsed.category,
                "Scan user agent"
            );
        }

        let country = country_header
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_country.clone());

        let new_scan = NewScan {
            id: Uuid::new_v4(),
            qr_code_id: link.id,
            device_type: device_type.as_str().to_string(),
            user_agent,
            country,
            scanned_at: Utc::now(),
        };

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        diesel::insert_into(scans::table)
            .values(&new_scan)
            .execute(&mut conn)
            .await?;

        debug!(slug = %slug, device = %device_type, "Scan recorded");

        // Notify listeners; losing the notification only delays a refresh
        if let Err(e) = self.redis_pool.publish_scan().await {
            debug!(error = %e, "Scan notification publish failed");
        }

        Ok(())
    }
}
