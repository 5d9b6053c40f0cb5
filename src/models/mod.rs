pub mod qr;
pub mod scan;
pub mod short_link;

pub use qr::{QrConfigUpdate, QrErrorLevel, QrRenderConfig, QrStyle};
pub use scan::{DeviceType, NewScan, Scan};
pub use short_link::{CreateShortLinkRequest, NewShortLink, ShortLink, ShortLinkResponse};
