pub mod analytics;
pub mod background_tasks;
pub mod qr;
pub mod scan_tracking;
pub mod short_link;
pub mod vcard;

pub use analytics::AnalyticsService;
pub use background_tasks::TaskTracker;
pub use qr::QrService;
pub use scan_tracking::ScanTrackingService;
pub use short_link::ShortLinkService;
pub use vcard::VCardService;
