// QR service: owns the single live render configuration and the selected
// short link, delegates drawing to the renderer.

pub mod renderer;

pub use renderer::{QrRenderer, StyledQrRenderer};

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::qr::{QrConfigUpdate, QrConfigView, QrRenderConfig};
use crate::utils::ServiceError;

/// Export artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

/// A rendered artifact ready for download
#[derive(Debug, Clone)]
pub struct QrExport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct QrService {
    config: Arc<RwLock<QrRenderConfig>>,
    selected_slug: Arc<RwLock<Option<String>>>,
    renderer: Arc<dyn QrRenderer>,
}

impl QrService {
    pub fn new(default_target: String) -> Self {
        Self::with_renderer(default_target, Arc::new(StyledQrRenderer))
    }

    pub fn with_renderer(default_target: String, renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            config: Arc::new(RwLock::new(QrRenderConfig::new(default_target))),
            selected_slug: Arc::new(RwLock::new(None)),
            renderer,
        }
    }

    pub async fn current(&self) -> QrConfigView {
        self.config.read().await.view()
    }

    /// Merge a partial update; a rejected update changes nothing
    pub async fn apply(&self, update: QrConfigUpdate) -> Result<QrConfigView, ServiceError> {
        let mut config = self.config.write().await;
        update.apply_to(&mut config)?;
        debug!(config = ?*config, "QR configuration updated");
        Ok(config.view())
    }

    /// Point the code at a short link's shareable URL
    pub async fn select_target(&self, slug: &str, short_url: String) {
        {
            let mut config = self.config.write().await;
            config.target_url = short_url;
        }
        *self.selected_slug.write().await = Some(slug.to_string());
        info!(slug = %slug, "QR target selected");
    }

    /// Decode and store the logo. Payloads that are not a decodable image are
    /// ignored and reported as rejected.
    pub async fn set_logo(&self, bytes: &[u8]) -> bool {
        match image::load_from_memory(bytes) {
            Ok(logo) => {
                self.config.write().await.logo = Some(Arc::new(logo));
                info!(bytes = bytes.len(), "QR logo set");
                true
            }
            Err(e) => {
                debug!(error = %e, "Rejected non-image logo upload");
                false
            }
        }
    }

    pub async fn clear_logo(&self) {
        self.config.write().await.logo = None;
    }

    /// Render the current configuration for download
    pub async fn export(&self, format: ExportFormat) -> Result<QrExport, ServiceError> {
        let config = self.config.read().await.clone();
        let bytes = match format {
            ExportFormat::Png => self.renderer.render_png(&config)?,
            ExportFormat::Svg => self.renderer.render_svg(&config)?.into_bytes(),
        };

        Ok(QrExport {
            bytes,
            filename: self.suggested_filename(format).await,
            content_type: format.content_type(),
        })
    }

    /// `{slug}-qr.{ext}` once a link is selected, a neutral name before
    async fn suggested_filename(&self, format: ExportFormat) -> String {
        match self.selected_slug.read().await.as_deref() {
            Some(slug) => format!("{}-qr.{}", slug, format.extension()),
            None => format!("qr-code.{}", format.extension()),
        }
    }
}

#[cfg(test)]
impl QrService {
    pub(crate) async fn logo(&self) -> Option<Arc<image::DynamicImage>> {
        self.config.read().await.logo.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr::QrStyle;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn service() -> QrService {
        QrService::new("https://example.com/card".to_string())
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn filename_follows_the_selected_slug() {
        let service = service();
        let export = service.export(ExportFormat::Png).await.unwrap();
        assert_eq!(export.filename, "qr-code.png");

        service
            .select_target("demo", "https://example.com/demo".to_string())
            .await;
        let export = service.export(ExportFormat::Svg).await.unwrap();
        assert_eq!(export.filename, "demo-qr.svg");
        assert_eq!(export.content_type, "image/svg+xml");
    }

    #[tokio::test]
    async fn selecting_a_target_changes_the_encoded_url() {
        let service = service();
        service
            .select_target("demo", "https://example.com/demo".to_string())
            .await;
        assert_eq!(service.current().await.target_url, "https://example.com/demo");
    }

    #[tokio::test]
    async fn non_image_logo_uploads_are_rejected() {
        let service = service();
        assert!(!service.set_logo(b"definitely not an image").await);
        assert!(service.logo().await.is_none());
        assert!(!service.current().await.has_logo);
    }

    #[tokio::test]
    async fn valid_logo_uploads_are_kept_until_cleared() {
        let service = service();
        assert!(service.set_logo(&png_bytes()).await);
        assert!(service.current().await.has_logo);

        service.clear_logo().await;
        assert!(!service.current().await.has_logo);
    }

    #[tokio::test]
    async fn rejected_updates_leave_the_config_untouched() {
        let service = service();
        let result = service
            .apply(QrConfigUpdate {
                style: Some(QrStyle::Dots),
                size: Some(123),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());

        let view = service.current().await;
        assert_eq!(view.size, 1000);
        assert_eq!(view.style, QrStyle::Rounded);
    }

    #[tokio::test]
    async fn select_configure_export_names_the_file_after_the_slug() {
        let service = service();
        service
            .select_target("demo", "https://example.com/x".to_string())
            .await;
        service
            .apply(QrConfigUpdate {
                style: Some(QrStyle::Dots),
                size: Some(1000),
                error_correction: Some(crate::models::qr::QrErrorLevel::H),
                ..Default::default()
            })
            .await
            .unwrap();

        let export = service.export(ExportFormat::Png).await.unwrap();
        assert_eq!(export.filename, "demo-qr.png");
        assert_eq!(export.content_type, "image/png");

        let decoded = image::load_from_memory(&export.bytes).unwrap();
        assert_eq!(decoded.width(), 1000);
    }

    #[tokio::test]
    async fn png_export_matches_the_configured_size() {
        let service = service();
        service
            .apply(QrConfigUpdate {
                size: Some(512),
                ..Default::default()
            })
            .await
            .unwrap();

        let export = service.export(ExportFormat::Png).await.unwrap();
        let decoded = image::load_from_memory(&export.bytes).unwrap();
        assert_eq!(decoded.width(), 512);
    }
}
