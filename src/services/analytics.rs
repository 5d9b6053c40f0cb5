// Scan analytics: windowed counts, device breakdown, daily histogram.
//
// The rollups are pure functions over loaded scan rows. The service keeps a
// cached snapshot for the default slug, refreshed by a worker that wakes on a
// timer and on scan notifications from Redis.

use chrono::{DateTime, Duration, Local, Months, NaiveDate, TimeZone, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::db::{DieselPool, RedisPool};
use crate::models::{DeviceType, Scan, ShortLink};
use crate::schema::{qr_codes, scans};
use crate::utils::ServiceError;

/// Cadence of timer-driven snapshot refreshes
const REFRESH_INTERVAL_SECS: u64 = 30;

/// Newest scans loaded per snapshot; window rollups derive from these
const RECENT_SCANS_LIMIT: i64 = 50;

/// Days covered by the daily histogram, including today
const HISTOGRAM_DAYS: i64 = 30;

// =============================================================================
// SNAPSHOT TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsSnapshot {
    pub slug: String,
    pub total_scans: u64,
    pub today_scans: u64,
    pub week_scans: u64,
    pub month_scans: u64,
    pub device_breakdown: DeviceBreakdown,
    pub daily_histogram: Vec<DayBucket>,
    pub recent_scans: Vec<Scan>,
    pub generated_at: DateTime<Utc>,
}

/// Counts per known device class; unrecognized stored values are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceBreakdown {
    pub ios: u64,
    pub android: u64,
    pub desktop: u64,
}

/// Scans that fell within one local day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub scans: u64,
}

// =============================================================================
// ROLLUPS
// =============================================================================

/// Scans at or after `cutoff`
pub fn count_since(all: &[Scan], cutoff: DateTime<Utc>) -> u64 {
    all.iter().filter(|s| s.scanned_at >= cutoff).count() as u64
}

/// Scans since local midnight of `now`'s day
pub fn today_count<Tz: TimeZone>(all: &[Scan], now: DateTime<Tz>) -> u64 {
    let midnight = day_start(now.date_naive(), &now.timezone());
    count_since(all, midnight)
}

pub fn week_count(all: &[Scan], now: DateTime<Utc>) -> u64 {
    count_since(all, now - Duration::days(7))
}

/// Scans in the trailing calendar month. February clamps the cutoff day the
/// way chrono clamps month arithmetic.
pub fn month_count(all: &[Scan], now: DateTime<Utc>) -> u64 {
    let cutoff = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    count_since(all, cutoff)
}

/// Tally stored device-type values; unrecognized values are ignored
pub fn device_breakdown<'a, I>(device_types: I) -> DeviceBreakdown
where
    I: IntoIterator<Item = &'a str>,
{
    let mut breakdown = DeviceBreakdown::default();
    for value in device_types {
        match DeviceType::parse(value) {
            Some(DeviceType::Ios) => breakdown.ios += 1,
            Some(DeviceType::Android) => breakdown.android += 1,
            Some(DeviceType::Desktop) => breakdown.desktop += 1,
            None => {}
        }
    }
    breakdown
}

/// One bucket per local day for the trailing window, oldest first, today last.
/// Each bucket is the half-open interval [day, day + 1) in `now`'s timezone.
pub fn daily_histogram<Tz: TimeZone>(all: &[Scan], now: DateTime<Tz>) -> Vec<DayBucket> {
    let today = now.date_naive();
    let tz = now.timezone();
    (0..HISTOGRAM_DAYS)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let start = day_start(day, &tz);
            let end = day_start(day + Duration::days(1), &tz);
            let scans = all
                .iter()
                .filter(|s| s.scanned_at >= start && s.scanned_at < end)
                .count() as u64;
            DayBucket { day, scans }
        })
        .collect()
}

/// Instant of local midnight, in UTC. DST gaps resolve to the earliest valid
/// local time.
fn day_start<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Clone)]
pub struct AnalyticsService {
    diesel_pool: DieselPool,
    default_slug: String,
    latest: Arc<RwLock<Option<AnalyticsSnapshot>>>,
}

impl AnalyticsService {
    pub fn new(diesel_pool: DieselPool, default_slug: String) -> Self {
        Self {
            diesel_pool,
            default_slug,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Snapshot for a slug. The default slug is served from the worker-kept
    /// cache while fresh; a stale or empty cache reloads on the request path
    /// so the dashboard keeps moving even without the worker. An explicit
    /// slug always loads fresh.
    pub async fn snapshot(&self, slug: Option<&str>) -> Result<AnalyticsSnapshot, ServiceError> {
        match slug {
            Some(slug) if slug != self.default_slug => self.load_snapshot(slug).await,
            _ => {
                if let Some(snapshot) = self.latest.read().await.clone() {
                    if is_fresh(&snapshot, Utc::now()) {
                        return Ok(snapshot);
                    }
                }
                let snapshot = self.load_snapshot(&self.default_slug).await?;
                *self.latest.write().await = Some(snapshot.clone());
                Ok(snapshot)
            }
        }
    }

    /// Reload the default-slug snapshot into the cache
    pub async fn refresh(&self) -> Result<(), ServiceError> {
        let snapshot = self.load_snapshot(&self.default_slug).await?;
        debug!(
            slug = %snapshot.slug,
            total = snapshot.total_scans,
            "Analytics snapshot refreshed"
        );
        *self.latest.write().await = Some(snapshot);
        Ok(())
    }

    async fn load_snapshot(&self, slug: &str) -> Result<AnalyticsSnapshot, ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        // Inactive links keep their history; no is_active filter here
        let link: ShortLink = qr_codes::table
            .filter(qr_codes::slug.eq(slug))
            .select(ShortLink::as_select())
            .first(&mut conn)
            .await?;

        let now = Utc::now();
        let local_now = now.with_timezone(&Local);
        let today_start = day_start(local_now.date_naive(), &Local);

        // Exact counts stay in the database; only the recent window is pulled
        // into memory for the rollups.
        let total_scans: i64 = scans::table
            .filter(scans::qr_code_id.eq(link.id))
            .count()
            .get_result(&mut conn)
            .await?;

        let today_scans: i64 = scans::table
            .filter(scans::qr_code_id.eq(link.id))
            .filter(scans::scanned_at.ge(today_start))
            .count()
            .get_result(&mut conn)
            .await?;

        let recent: Vec<Scan> = scans::table
            .filter(scans::qr_code_id.eq(link.id))
            .order(scans::scanned_at.desc())
            .limit(RECENT_SCANS_LIMIT)
            .select(Scan::as_select())
            .load(&mut conn)
            .await?;

        let device_types: Vec<String> = scans::table
            .filter(scans::qr_code_id.eq(link.id))
            .select(scans::device_type)
            .load(&mut conn)
            .await?;

        Ok(AnalyticsSnapshot {
            slug: link.slug,
            total_scans: total_scans as u64,
            today_scans: today_scans as u64,
            week_scans: week_count(&recent, now),
            month_scans: month_count(&recent, now),
            device_breakdown: device_breakdown(device_types.iter().map(String::as_str)),
            daily_histogram: daily_histogram(&recent, local_now),
            recent_scans: recent,
            generated_at: now,
        })
    }
}

/// A cached snapshot older than the refresh cadence must be reloaded
fn is_fresh(snapshot: &AnalyticsSnapshot, now: DateTime<Utc>) -> bool {
    now - snapshot.generated_at < Duration::seconds(REFRESH_INTERVAL_SECS as i64)
}

// =============================================================================
// REFRESH WORKER
// =============================================================================

/// Keep the default-slug snapshot warm: refresh on a timer and on every scan
/// notification, until the shutdown signal fires.
pub fn spawn_refresh_worker(
    service: Arc<AnalyticsService>,
    redis_pool: RedisPool,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(REFRESH_INTERVAL_SECS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pubsub = match redis_pool.subscribe_scans().await {
            Ok(pubsub) => Some(pubsub),
            Err(e) => {
                warn!(error = %e, "Scan channel unavailable, refreshing on timer only");
                None
            }
        };

        info!("Analytics refresh worker started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                ended = wait_for_notification(&mut pubsub) => {
                    if ended {
                        warn!("Scan channel closed, refreshing on timer only");
                        pubsub = None;
                        continue;
                    }
                    debug!("Scan notification received");
                }
                _ = shutdown.changed() => {
                    info!("Analytics refresh worker stopping");
                    break;
                }
            }

            if let Err(e) = service.refresh().await {
                warn!(error = %e, "Analytics refresh failed");
            }
        }
    })
}

/// Resolves on the next notification; true means the stream closed
async fn wait_for_notification(pubsub: &mut Option<redis::aio::PubSub>) -> bool {
    match pubsub {
        Some(pubsub) => pubsub.on_message().next().await.is_none(),
        None => std::future::pending().await,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn scan_at(when: DateTime<Utc>, device: &str) -> Scan {
        Scan {
            id: Uuid::new_v4(),
            qr_code_id: Uuid::nil(),
            device_type: device.to_string(),
            user_agent: String::new(),
            country: "QA".to_string(),
            scanned_at: when,
        }
    }

    #[test]
    fn today_counts_from_midnight() {
        let now = fixed_now();
        let all = vec![
            scan_at(now - Duration::hours(1), "iOS"),
            scan_at(now - Duration::hours(11), "iOS"),
            // 13 hours ago is yesterday relative to 12:00
            scan_at(now - Duration::hours(13), "iOS"),
        ];
        assert_eq!(today_count(&all, now), 2);
    }

    #[test]
    fn day_boundaries_follow_the_reporting_timezone() {
        use chrono::FixedOffset;

        // 23:30 UTC yesterday is already "today" at UTC+3
        let now = fixed_now();
        let all = vec![scan_at(now - Duration::hours(13) + Duration::minutes(30), "iOS")];

        assert_eq!(today_count(&all, now), 0);

        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let local_now = now.with_timezone(&plus_three);
        assert_eq!(today_count(&all, local_now), 1);
    }

    #[test]
    fn week_window_is_inclusive_of_the_boundary() {
        let now = fixed_now();
        let all = vec![
            scan_at(now - Duration::days(7), "Desktop"),
            scan_at(now - Duration::days(8), "Desktop"),
        ];
        assert_eq!(week_count(&all, now), 1);
    }

    #[test]
    fn month_window_uses_calendar_months() {
        // June 15th 12:00 looks back to May 15th 12:00, not a fixed 30 days
        let now = fixed_now();
        let all = vec![
            scan_at(Utc.with_ymd_and_hms(2025, 5, 16, 0, 0, 0).unwrap(), "Desktop"),
            scan_at(Utc.with_ymd_and_hms(2025, 5, 15, 12, 0, 0).unwrap(), "Desktop"),
            scan_at(Utc.with_ymd_and_hms(2025, 5, 15, 11, 59, 59).unwrap(), "Desktop"),
        ];
        assert_eq!(month_count(&all, now), 2);
    }

    #[test]
    fn month_window_clamps_short_months() {
        // One month before March 31st clamps to February 28th
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let all = vec![
            scan_at(Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap(), "Desktop"),
            scan_at(Utc.with_ymd_and_hms(2025, 2, 28, 11, 0, 0).unwrap(), "Desktop"),
        ];
        assert_eq!(month_count(&all, now), 1);
    }

    #[test]
    fn device_breakdown_skips_unknown_values() {
        let types = ["iOS", "iOS", "Android", "Desktop", "SmartFridge"];
        assert_eq!(
            device_breakdown(types),
            DeviceBreakdown {
                ios: 2,
                android: 1,
                desktop: 1,
            }
        );
    }

    #[test]
    fn cached_snapshots_go_stale_after_the_refresh_interval() {
        let generated_at = fixed_now();
        let snapshot = AnalyticsSnapshot {
            slug: "demo".to_string(),
            total_scans: 0,
            today_scans: 0,
            week_scans: 0,
            month_scans: 0,
            device_breakdown: DeviceBreakdown::default(),
            daily_histogram: Vec::new(),
            recent_scans: Vec::new(),
            generated_at,
        };

        let interval = Duration::seconds(REFRESH_INTERVAL_SECS as i64);
        assert!(is_fresh(&snapshot, generated_at));
        assert!(is_fresh(&snapshot, generated_at + interval - Duration::seconds(1)));
        assert!(!is_fresh(&snapshot, generated_at + interval));
    }

    #[test]
    fn histogram_covers_thirty_days_ending_today() {
        let now = fixed_now();
        let today = now.date_naive();
        let all = vec![
            scan_at(now, "iOS"),
            scan_at(now - Duration::days(1), "iOS"),
            scan_at(now - Duration::days(29), "iOS"),
            // Before the window, must not appear anywhere
            scan_at(now - Duration::days(30), "iOS"),
        ];

        let histogram = daily_histogram(&all, now);
        assert_eq!(histogram.len(), 30);
        assert_eq!(histogram.as_slice().first().unwrap().day, today - Duration::days(29));
        assert_eq!(histogram.last().unwrap().day, today);

        assert_eq!(histogram.last().unwrap().scans, 1);
        assert_eq!(histogram[28].scans, 1);
        assert_eq!(histogram[0].scans, 1);

        let total: u64 = histogram.iter().map(|b| b.scans).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn histogram_buckets_are_half_open_day_intervals() {
        let now = fixed_now();
        let today = now.date_naive();
        let midnight = today.and_hms_opt(0, 0, 0).unwrap().and_utc();

        let all = vec![
            scan_at(midnight, "iOS"),
            scan_at(midnight - Duration::seconds(1), "iOS"),
        ];

        let histogram = daily_histogram(&all, now);
        assert_eq!(histogram.last().unwrap().scans, 1);
        assert_eq!(histogram[28].scans, 1);
    }
}
