// In-memory QR render configuration.
//
// A render is fully determined by the current config; changing any field
// regenerates the artifact from scratch, never patches it.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::utils::ServiceError;

/// Pixel dimensions the admin can pick from
pub const QR_SIZES: [u32; 4] = [512, 1000, 2000, 4000];

/// Fraction of the bounding box the embedded logo occupies
pub const LOGO_IMAGE_SIZE: f64 = 0.4;

/// Clear margin around the embedded logo, in pixels
pub const LOGO_MARGIN_PX: u32 = 8;

/// Module drawing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QrStyle {
    Square,
    Rounded,
    ClassyRounded,
    Dots,
}

/// Error-correction level: more redundancy survives more occlusion,
/// at the cost of payload density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum QrErrorLevel {
    L,
    M,
    Q,
    H,
}

/// The one live render configuration owned by the QR service
#[derive(Clone)]
pub struct QrRenderConfig {
    /// Resolved redirect target the code encodes
    pub target_url: String,
    pub dots_color: String,
    pub background_color: String,
    pub style: QrStyle,
    pub size: u32,
    pub error_correction: QrErrorLevel,
    /// Center-overlaid logo; decoded once at upload time
    pub logo: Option<Arc<DynamicImage>>,
}

impl std::fmt::Debug for QrRenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrRenderConfig")
            .field("target_url", &self.target_url)
            .field("dots_color", &self.dots_color)
            .field("background_color", &self.background_color)
            .field("style", &self.style)
            .field("size", &self.size)
            .field("error_correction", &self.error_correction)
            .field("has_logo", &self.logo.is_some())
            .finish()
    }
}

impl QrRenderConfig {
    /// Defaults matching the admin screen's initial state
    pub fn new(target_url: String) -> Self {
        Self {
            target_url,
            dots_color: "#ffffff".to_string(),
            background_color: "#2b2c2c".to_string(),
            style: QrStyle::Rounded,
            size: 1000,
            error_correction: QrErrorLevel::H,
            logo: None,
        }
    }

    pub fn view(&self) -> QrConfigView {
        QrConfigView {
            target_url: self.target_url.clone(),
            dots_color: self.dots_color.clone(),
            background_color: self.background_color.clone(),
            style: self.style,
            size: self.size,
            error_correction: self.error_correction,
            has_logo: self.logo.is_some(),
        }
    }
}

/// Partial update merged into the current config
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QrConfigUpdate {
    pub dots_color: Option<String>,
    pub background_color: Option<String>,
    pub style: Option<QrStyle>,
    pub size: Option<u32>,
    pub error_correction: Option<QrErrorLevel>,
}

impl QrConfigUpdate {
    /// Validate the update and merge it into `config`
    pub fn apply_to(&self, config: &mut QrRenderConfig) -> Result<(), ServiceError> {
        if let Some(size) = self.size {
            if !QR_SIZES.contains(&size) {
                return Err(ServiceError::Validation(format!(
                    "Size must be one of {:?}",
                    QR_SIZES
                )));
            }
        }
        if let Some(color) = &self.dots_color {
            parse_hex_color(color)?;
        }
        if let Some(color) = &self.background_color {
            parse_hex_color(color)?;
        }

        if let Some(color) = &self.dots_color {
            config.dots_color = color.clone();
        }
        if let Some(color) = &self.background_color {
            config.background_color = color.clone();
        }
        if let Some(style) = self.style {
            config.style = style;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(level) = self.error_correction {
            config.error_correction = level;
        }
        Ok(())
    }
}

/// Config as reported to the admin screen
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QrConfigView {
    pub target_url: String,
    pub dots_color: String,
    pub background_color: String,
    pub style: QrStyle,
    pub size: u32,
    pub error_correction: QrErrorLevel,
    pub has_logo: bool,
}

/// Parse a `#rrggbb` color into RGBA bytes (full alpha)
pub fn parse_hex_color(color: &str) -> Result<[u8; 4], ServiceError> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| invalid_color(color))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid_color(color));
    }
    let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid_color(color))?;
    let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid_color(color))?;
    let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid_color(color))?;
    Ok([r, g, b, 255])
}

fn invalid_color(color: &str) -> ServiceError {
    ServiceError::Validation(format!("Invalid color '{}': expected #rrggbb", color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#ffffff").unwrap(), [255, 255, 255, 255]);
        assert_eq!(parse_hex_color("#2b2c2c").unwrap(), [0x2b, 0x2c, 0x2c, 255]);
        assert!(parse_hex_color("ffffff").is_err());
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn update_rejects_unsupported_sizes() {
        let mut config = QrRenderConfig::new("https://example.com".into());
        let update = QrConfigUpdate {
            size: Some(999),
            ..Default::default()
        };
        assert!(update.apply_to(&mut config).is_err());
        // Nothing merged from a rejected update
        assert_eq!(config.size, 1000);
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let mut config = QrRenderConfig::new("https://example.com".into());
        let update = QrConfigUpdate {
            style: Some(QrStyle::Dots),
            size: Some(2000),
            ..Default::default()
        };
        update.apply_to(&mut config).unwrap();
        assert_eq!(config.style, QrStyle::Dots);
        assert_eq!(config.size, 2000);
        assert_eq!(config.dots_color, "#ffffff");
        assert_eq!(config.error_correction, QrErrorLevel::H);
    }

    #[test]
    fn style_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&QrStyle::ClassyRounded).unwrap(),
            "\"classy-rounded\""
        );
        let style: QrStyle = serde_json::from_str("\"dots\"").unwrap();
        assert_eq!(style, QrStyle::Dots);
    }
}
