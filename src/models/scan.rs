// Scan events: one append-only row per visit to a tracked short link

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::scans;

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Scan record as stored in `scans`
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = scans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Scan {
    pub id: Uuid,
    pub qr_code_id: Uuid,
    pub device_type: String,
    pub user_agent: String,
    pub country: String,
    pub scanned_at: DateTime<Utc>,
}

/// New scan for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scans)]
pub struct NewScan {
    pub id: Uuid,
    pub qr_code_id: Uuid,
    pub device_type: String,
    pub user_agent: String,
    pub country: String,
    pub scanned_at: DateTime<Utc>,
}

// =============================================================================
// DEVICE CLASSIFICATION
// =============================================================================

lazy_static! {
    static ref IOS_UA: Regex = Regex::new(r"(?i)iPhone|iPad|iPod").unwrap();
    static ref ANDROID_UA: Regex = Regex::new(r"(?i)Android").unwrap();
}

/// Visiting client class, derived from the user-agent string.
/// Anything that is neither an iOS nor an Android pattern counts as Desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DeviceType {
    #[serde(rename = "iOS")]
    Ios,
    Android,
    Desktop,
}

impl DeviceType {
    /// Fixed classification rule: iOS patterns win, then Android, else Desktop
    pub fn from_user_agent(user_agent: &str) -> Self {
        if IOS_UA.is_match(user_agent) {
            DeviceType::Ios
        } else if ANDROID_UA.is_match(user_agent) {
            DeviceType::Android
        } else {
            DeviceType::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ios => "iOS",
            DeviceType::Android => "Android",
            DeviceType::Desktop => "Desktop",
        }
    }

    /// Parse a stored device type; unknown values are not an error, they are
    /// simply absent from breakdowns.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "iOS" => Some(DeviceType::Ios),
            "Android" => Some(DeviceType::Android),
            "Desktop" => Some(DeviceType::Desktop),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const ANDROID_UA_STR: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) \
                                  AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";
    const DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                              AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

    #[test]
    fn iphone_classifies_as_ios() {
        assert_eq!(DeviceType::from_user_agent(IPHONE_UA), DeviceType::Ios);
    }

    #[test]
    fn ipad_classifies_as_ios() {
        let ua = "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15";
        assert_eq!(DeviceType::from_user_agent(ua), DeviceType::Ios);
    }

    #[test]
    fn android_classifies_as_android() {
        assert_eq!(
            DeviceType::from_user_agent(ANDROID_UA_STR),
            DeviceType::Android
        );
    }

    #[test]
    fn everything_else_classifies_as_desktop() {
        assert_eq!(DeviceType::from_user_agent(DESKTOP_UA), DeviceType::Desktop);
        assert_eq!(DeviceType::from_user_agent(""), DeviceType::Desktop);
    }

    #[test]
    fn stored_values_round_trip_and_unknowns_are_ignored() {
        assert_eq!(DeviceType::parse("iOS"), Some(DeviceType::Ios));
        assert_eq!(DeviceType::parse("Android"), Some(DeviceType::Android));
        assert_eq!(DeviceType::parse("Desktop"), Some(DeviceType::Desktop));
        assert_eq!(DeviceType::parse("SmartFridge"), None);
    }
}
