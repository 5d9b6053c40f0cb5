// Styled QR artifact rendering.
//
// The matrix comes from the `qrcode` crate; all drawing is done here so the
// visual parameters (style, colors, size, logo) stay under our control. The
// render is a pure function of the configuration.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

use crate::models::qr::{
    parse_hex_color, QrErrorLevel, QrRenderConfig, QrStyle, LOGO_IMAGE_SIZE, LOGO_MARGIN_PX,
};
use crate::utils::ServiceError;

/// Quiet-zone border, in modules, on every side
const QUIET_ZONE_MODULES: u32 = 4;

/// Narrow rendering seam: the service owns configuration and orchestration,
/// the renderer owns the drawing.
pub trait QrRenderer: Send + Sync {
    fn render_png(&self, config: &QrRenderConfig) -> Result<Vec<u8>, ServiceError>;
    fn render_svg(&self, config: &QrRenderConfig) -> Result<String, ServiceError>;
}

/// Default renderer: square/rounded/classy-rounded/dots modules, hex colors,
/// optional center logo with suppressed background modules.
#[derive(Debug, Default)]
pub struct StyledQrRenderer;

struct ModuleMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// Pixel box cleared for the logo, when one is embedded
#[derive(Debug, Clone, Copy)]
struct ClearBox {
    min: f64,
    max: f64,
}

impl ClearBox {
    fn for_logo(size: u32) -> Self {
        let logo_px = size as f64 * LOGO_IMAGE_SIZE;
        let clear = logo_px + 2.0 * LOGO_MARGIN_PX as f64;
        let min = (size as f64 - clear) / 2.0;
        Self {
            min,
            max: min + clear,
        }
    }

    fn intersects(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        x0 < self.max && x1 > self.min && y0 < self.max && y1 > self.min
    }
}

impl QrRenderer for StyledQrRenderer {
    fn render_png(&self, config: &QrRenderConfig) -> Result<Vec<u8>, ServiceError> {
        let matrix = build_matrix(config)?;
        let dots = Rgba(parse_hex_color(&config.dots_color)?);
        let background = Rgba(parse_hex_color(&config.background_color)?);

        let size = config.size;
        let total_modules = matrix.width as u32 + 2 * QUIET_ZONE_MODULES;
        let module_px = size as f64 / total_modules as f64;

        let clear_box = config.logo.as_ref().map(|_| ClearBox::for_logo(size));

        let mut canvas = RgbaImage::from_pixel(size, size, background);

        for my in 0..matrix.width {
            for mx in 0..matrix.width {
                if !matrix.is_dark(mx, my) {
                    continue;
                }

                let x0 = (mx as u32 + QUIET_ZONE_MODULES) as f64 * module_px;
                let y0 = (my as u32 + QUIET_ZONE_MODULES) as f64 * module_px;
                let x1 = x0 + module_px;
                let y1 = y0 + module_px;

                // Fixed policy: modules under the logo are always suppressed
                if let Some(clear) = clear_box {
                    if clear.intersects(x0, y0, x1, y1) {
                        continue;
                    }
                }

                paint_module(&mut canvas, config.style, dots, x0, y0, module_px);
            }
        }

        if let Some(logo) = &config.logo {
            overlay_logo(&mut canvas, logo, size);
        }

        let mut out = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| ServiceError::Internal(format!("PNG encoding failed: {}", e)))?;
        Ok(out)
    }

    fn render_svg(&self, config: &QrRenderConfig) -> Result<String, ServiceError> {
        let matrix = build_matrix(config)?;
        // Validate up front so the emitted attributes are known-good hex
        parse_hex_color(&config.dots_color)?;
        parse_hex_color(&config.background_color)?;

        let size = config.size;
        let total_modules = matrix.width as u32 + 2 * QUIET_ZONE_MODULES;
        let module_px = size as f64 / total_modules as f64;

        let clear_box = config.logo.as_ref().map(|_| ClearBox::for_logo(size));

        let mut svg = String::with_capacity(matrix.width * matrix.width * 32);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="{size}" height="{size}" fill="{}"/>"#,
            config.background_color
        ));

        for my in 0..matrix.width {
            for mx in 0..matrix.width {
                if !matrix.is_dark(mx, my) {
                    continue;
                }

                let x0 = (mx as u32 + QUIET_ZONE_MODULES) as f64 * module_px;
                let y0 = (my as u32 + QUIET_ZONE_MODULES) as f64 * module_px;

                if let Some(clear) = clear_box {
                    if clear.intersects(x0, y0, x0 + module_px, y0 + module_px) {
                        continue;
                    }
                }

                svg.push_str(&svg_module(
                    config.style,
                    &config.dots_color,
                    x0,
                    y0,
                    module_px,
                ));
            }
        }

        if let Some(logo) = &config.logo {
            svg.push_str(&svg_logo(logo, size)?);
        }

        svg.push_str("</svg>");
        Ok(svg)
    }
}

/// Encode the target URL into a module matrix
fn build_matrix(config: &QrRenderConfig) -> Result<ModuleMatrix, ServiceError> {
    let ec_level = match config.error_correction {
        QrErrorLevel::L => EcLevel::L,
        QrErrorLevel::M => EcLevel::M,
        QrErrorLevel::Q => EcLevel::Q,
        QrErrorLevel::H => EcLevel::H,
    };

    let code = QrCode::with_error_correction_level(config.target_url.as_bytes(), ec_level)
        .map_err(|e| ServiceError::Validation(format!("Cannot encode target URL: {:?}", e)))?;

    let width = code.width();
    let dark = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();

    Ok(ModuleMatrix { width, dark })
}

/// Paint one dark module onto the raster canvas
fn paint_module(canvas: &mut RgbaImage, style: QrStyle, color: Rgba<u8>, x0: f64, y0: f64, s: f64) {
    let size = canvas.width();
    let px_start = x0.floor().max(0.0) as u32;
    let py_start = y0.floor().max(0.0) as u32;
    let px_end = ((x0 + s).ceil() as u32).min(size);
    let py_end = ((y0 + s).ceil() as u32).min(size);

    for py in py_start..py_end {
        for px in px_start..px_end {
            let fx = (px as f64 + 0.5 - x0) / s;
            let fy = (py as f64 + 0.5 - y0) / s;
            if (0.0..1.0).contains(&fx) && (0.0..1.0).contains(&fy) && covers(style, fx, fy) {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// Is the point (fx, fy), in unit module coordinates, inside the styled shape?
fn covers(style: QrStyle, fx: f64, fy: f64) -> bool {
    match style {
        QrStyle::Square => true,
        QrStyle::Dots => {
            let dx = fx - 0.5;
            let dy = fy - 0.5;
            dx * dx + dy * dy <= 0.25
        }
        QrStyle::Rounded => in_rounded_square(fx, fy, 0.35, [true, true, true, true]),
        // Opposite corners rounded gives the "classy" leaf shape
        QrStyle::ClassyRounded => in_rounded_square(fx, fy, 0.5, [true, false, true, false]),
    }
}

/// Rounded unit square; `corners` flags are [NW, NE, SE, SW]
fn in_rounded_square(fx: f64, fy: f64, r: f64, corners: [bool; 4]) -> bool {
    let inside_corner = |cx: f64, cy: f64| {
        let dx = fx - cx;
        let dy = fy - cy;
        dx * dx + dy * dy <= r * r
    };

    if corners[0] && fx < r && fy < r {
        return inside_corner(r, r);
    }
    if corners[1] && fx > 1.0 - r && fy < r {
        return inside_corner(1.0 - r, r);
    }
    if corners[2] && fx > 1.0 - r && fy > 1.0 - r {
        return inside_corner(1.0 - r, 1.0 - r);
    }
    if corners[3] && fx < r && fy > 1.0 - r {
        return inside_corner(r, 1.0 - r);
    }
    true
}

/// One dark module as an SVG element
fn svg_module(style: QrStyle, color: &str, x0: f64, y0: f64, s: f64) -> String {
    match style {
        QrStyle::Square => format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x0, y0, s, s, color
        ),
        QrStyle::Rounded => format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}"/>"#,
            x0,
            y0,
            s,
            s,
            s * 0.35,
            color
        ),
        QrStyle::Dots => format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            x0 + s / 2.0,
            y0 + s / 2.0,
            s / 2.0,
            color
        ),
        QrStyle::ClassyRounded => {
            let r = s * 0.5;
            let (x1, y1) = (x0 + s, y0 + s);
            format!(
                r#"<path d="M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} A {r:.2} {r:.2} 0 0 1 {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} A {r:.2} {r:.2} 0 0 1 {:.2} {:.2} Z" fill="{}"/>"#,
                x0 + r,
                y0,
                x1,
                y0,
                x1,
                y1 - r,
                x1 - r,
                y1,
                x0,
                y1,
                x0,
                y0 + r,
                x0 + r,
                y0,
                color
            )
        }
    }
}

/// Embed the logo as a base64 PNG image element
fn svg_logo(logo: &DynamicImage, size: u32) -> Result<String, ServiceError> {
    let logo_px = (size as f64 * LOGO_IMAGE_SIZE) as u32;
    let scaled = logo.resize(logo_px, logo_px, FilterType::Triangle);

    let mut bytes = Vec::new();
    scaled
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ServiceError::Internal(format!("Logo encoding failed: {}", e)))?;

    let x = (size - scaled.width()) / 2;
    let y = (size - scaled.height()) / 2;
    Ok(format!(
        r#"<image x="{}" y="{}" width="{}" height="{}" href="data:image/png;base64,{}"/>"#,
        x,
        y,
        scaled.width(),
        scaled.height(),
        BASE64.encode(&bytes)
    ))
}

/// Scale the logo to the configured fraction and center it on the canvas
fn overlay_logo(canvas: &mut RgbaImage, logo: &DynamicImage, size: u32) {
    let logo_px = (size as f64 * LOGO_IMAGE_SIZE) as u32;
    let scaled = logo.resize(logo_px, logo_px, FilterType::Triangle).to_rgba8();

    let x = ((size - scaled.width()) / 2) as i64;
    let y = ((size - scaled.height()) / 2) as i64;
    image::imageops::overlay(canvas, &scaled, x, y);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr::QrConfigUpdate;
    use std::sync::Arc;

    fn test_config() -> QrRenderConfig {
        let mut config = QrRenderConfig::new("https://example.com/x".to_string());
        config.size = 512;
        config
    }

    fn solid_logo() -> Arc<DynamicImage> {
        let img = RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]));
        Arc::new(DynamicImage::ImageRgba8(img))
    }

    #[test]
    fn png_has_configured_dimensions() {
        let renderer = StyledQrRenderer;
        let bytes = renderer.render_png(&test_config()).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 512);
        assert_eq!(decoded.height(), 512);
    }

    #[test]
    fn render_is_a_function_of_the_final_config_only() {
        let renderer = StyledQrRenderer;

        // Apply two partial updates in sequence...
        let mut stepwise = test_config();
        QrConfigUpdate {
            style: Some(QrStyle::Dots),
            ..Default::default()
        }
        .apply_to(&mut stepwise)
        .unwrap();
        QrConfigUpdate {
            dots_color: Some("#00ff00".to_string()),
            ..Default::default()
        }
        .apply_to(&mut stepwise)
        .unwrap();

        // ...and the merged update directly
        let mut merged = test_config();
        QrConfigUpdate {
            style: Some(QrStyle::Dots),
            dots_color: Some("#00ff00".to_string()),
            ..Default::default()
        }
        .apply_to(&mut merged)
        .unwrap();

        assert_eq!(
            renderer.render_png(&stepwise).unwrap(),
            renderer.render_png(&merged).unwrap()
        );
        assert_eq!(
            renderer.render_svg(&stepwise).unwrap(),
            renderer.render_svg(&merged).unwrap()
        );
    }

    #[test]
    fn svg_contains_background_and_dot_colors() {
        let renderer = StyledQrRenderer;
        let svg = renderer.render_svg(&test_config()).unwrap();
        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r##"fill="#2b2c2c""##));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r#"width="512""#));
    }

    #[test]
    fn dots_style_emits_circles() {
        let renderer = StyledQrRenderer;
        let mut config = test_config();
        config.style = QrStyle::Dots;
        let svg = renderer.render_svg(&config).unwrap();
        assert!(svg.contains("<circle "));
        assert!(!svg.contains("<rect x="));
    }

    #[test]
    fn logo_is_overlaid_and_background_dots_suppressed() {
        let renderer = StyledQrRenderer;
        let mut config = test_config();
        let without_logo = renderer.render_png(&config).unwrap();

        config.logo = Some(solid_logo());
        let with_logo = renderer.render_png(&config).unwrap();
        assert_ne!(without_logo, with_logo);

        // The center pixel is logo red, not dots or background
        let decoded = image::load_from_memory(&with_logo).unwrap().to_rgba8();
        let center = decoded.get_pixel(256, 256);
        assert_eq!(center, &Rgba([255, 0, 0, 255]));

        // The SVG path embeds the logo as a data URI and stays valid
        let svg = renderer.render_svg(&config).unwrap();
        assert!(svg.contains("data:image/png;base64,"));
    }

    #[test]
    fn non_encodable_payload_is_a_validation_error() {
        let renderer = StyledQrRenderer;
        let mut config = test_config();
        config.target_url = "x".repeat(5000);
        assert!(matches!(
            renderer.render_png(&config),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn invalid_color_is_a_validation_error() {
        let renderer = StyledQrRenderer;
        let mut config = test_config();
        config.dots_color = "white".to_string();
        assert!(matches!(
            renderer.render_png(&config),
            Err(ServiceError::Validation(_))
        ));
    }
}
