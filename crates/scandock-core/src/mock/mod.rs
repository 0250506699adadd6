//! Mock implementations of the capability traits for testing.
//!
//! This module provides a unified mock provider that implements
//! [`ScannerProvider`], [`OcrProvider`], and [`PrintProvider`]. The mocks
//! return sensible defaults and can be switched into typed failure modes to
//! exercise error paths.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! scandock-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use scandock_core::ErrorKind;
//! use scandock_core::mock::MockProvider;
//!
//! // Scans succeed, OCR always fails.
//! let provider = MockProvider::default().failing_ocr();
//!
//! // Scanner that times out.
//! let provider = MockProvider::default().failing_scanner(ErrorKind::ScannerTimeout);
//! ```

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::document::PageFormat;
use crate::ocr::{OcrOptions, OcrProvider};
use crate::print::{PrintJob, PrintProvider};
use crate::scan::{ScanOptions, ScannedImage, ScannerProvider};
use crate::{Error, ErrorKind, Result, ServiceHealth};

/// Configuration for the mock provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Width of generated page images in pixels.
    #[serde(default = "default_page_width")]
    pub page_width: u32,

    /// Height of generated page images in pixels.
    #[serde(default = "default_page_height")]
    pub page_height: u32,

    /// Queue names reported by the mock spooler.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,
}

fn default_page_width() -> u32 {
    64
}

fn default_page_height() -> u32 {
    96
}

fn default_queues() -> Vec<String> {
    vec!["Office_Laser".to_owned()]
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            queues: default_queues(),
        }
    }
}

/// Unified mock provider for testing.
///
/// Implements all three capability traits, returning generated pages and
/// recorded print jobs. Failure modes are opt-in per trait.
#[derive(Clone, Debug, Default)]
pub struct MockProvider {
    config: Arc<MockConfig>,
    scan_failure: Option<ErrorKind>,
    ocr_failure: bool,
    print_failure: Option<ErrorKind>,
    pages_scanned: Arc<AtomicU32>,
    jobs_submitted: Arc<AtomicU32>,
}

impl MockProvider {
    /// Creates a new mock provider with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..Default::default()
        }
    }

    /// Makes every scan fail with the given kind.
    pub fn failing_scanner(mut self, kind: ErrorKind) -> Self {
        self.scan_failure = Some(kind);
        self
    }

    /// Makes every OCR pass fail.
    pub fn failing_ocr(mut self) -> Self {
        self.ocr_failure = true;
        self
    }

    /// Makes every print submission fail with the given kind.
    pub fn failing_printer(mut self, kind: ErrorKind) -> Self {
        self.print_failure = Some(kind);
        self
    }

    /// Number of pages scanned so far.
    pub fn pages_scanned(&self) -> u32 {
        self.pages_scanned.load(Ordering::SeqCst)
    }

    /// Number of print jobs submitted so far.
    pub fn jobs_submitted(&self) -> u32 {
        self.jobs_submitted.load(Ordering::SeqCst)
    }

    /// Renders one page image, varying pixel content with the page counter
    /// so consecutive scans produce distinct payloads.
    fn render_page(&self, seed: u32) -> Result<Bytes> {
        let (width, height) = (self.config.page_width, self.config.page_height);
        let shade = 192u8.wrapping_add((seed % 16) as u8);
        let page = RgbImage::from_fn(width, height, |x, y| {
            if (x + y + seed) % 17 == 0 {
                image::Rgb([32, 32, 32])
            } else {
                image::Rgb([shade, shade, shade])
            }
        });

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(page)
            .write_to(&mut buffer, ImageFormat::Jpeg)
            .map_err(|e| Error::internal().with_message(e.to_string()))?;
        Ok(Bytes::from(buffer.into_inner()))
    }
}

#[async_trait::async_trait]
impl ScannerProvider for MockProvider {
    async fn scan_page(&self, _options: &ScanOptions) -> Result<ScannedImage> {
        if let Some(kind) = self.scan_failure {
            return Err(Error::new(kind).with_message("mock scanner failure"));
        }

        let seed = self.pages_scanned.fetch_add(1, Ordering::SeqCst);
        let bytes = self.render_page(seed)?;
        Ok(ScannedImage {
            bytes,
            format: PageFormat::Jpeg,
        })
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        match self.scan_failure {
            Some(kind) => Ok(ServiceHealth::unhealthy(format!(
                "mock scanner failing with {kind:?}"
            ))),
            None => Ok(ServiceHealth::healthy()),
        }
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockProvider {
    async fn process(&self, input: &Path, output: &Path, options: &OcrOptions) -> Result<()> {
        options.validate()?;
        if self.ocr_failure {
            return Err(Error::ocr_failed().with_message("mock ocr failure"));
        }

        tokio::fs::copy(input, output)
            .await
            .map_err(|e| Error::ocr_failed().with_source(e))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        if self.ocr_failure {
            Ok(ServiceHealth::unhealthy("mock ocr failing"))
        } else {
            Ok(ServiceHealth::healthy())
        }
    }
}

#[async_trait::async_trait]
impl PrintProvider for MockProvider {
    async fn queues(&self) -> Result<Vec<String>> {
        if let Some(kind) = self.print_failure {
            return Err(Error::new(kind).with_message("mock spooler failure"));
        }
        Ok(self.config.queues.clone())
    }

    async fn submit(&self, _path: &Path, queue: &str) -> Result<PrintJob> {
        if let Some(kind) = self.print_failure {
            return Err(Error::new(kind).with_message("mock spooler failure"));
        }

        let id = self.jobs_submitted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PrintJob {
            id: format!("{queue}-{id}"),
            queue: queue.to_owned(),
        })
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        match self.print_failure {
            Some(kind) => Ok(ServiceHealth::unhealthy(format!(
                "mock spooler failing with {kind:?}"
            ))),
            None => Ok(ServiceHealth::healthy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_scanner_produces_decodable_jpeg() {
        let provider = MockProvider::default();
        let image = provider.scan_page(&ScanOptions::default()).await.unwrap();

        assert_eq!(image.format, PageFormat::Jpeg);
        assert_eq!(PageFormat::sniff(&image.bytes), Some(PageFormat::Jpeg));
        assert!(image::load_from_memory(&image.bytes).is_ok());
        assert_eq!(provider.pages_scanned(), 1);
    }

    #[tokio::test]
    async fn consecutive_scans_differ() {
        let provider = MockProvider::default();
        let first = provider.scan_page(&ScanOptions::default()).await.unwrap();
        let second = provider.scan_page(&ScanOptions::default()).await.unwrap();
        assert_ne!(first.bytes, second.bytes);
    }

    #[tokio::test]
    async fn failing_scanner_reports_kind() {
        let provider = MockProvider::default().failing_scanner(ErrorKind::ScannerTimeout);
        let error = provider
            .scan_page(&ScanOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ScannerTimeout);
    }

    #[tokio::test]
    async fn mock_ocr_copies_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("draft.pdf");
        let output = dir.path().join("final.pdf");
        tokio::fs::write(&input, b"%PDF-1.5 test").await.unwrap();

        let provider = MockProvider::default();
        provider
            .process(&input, &output, &OcrOptions::default())
            .await
            .unwrap();

        let copied = tokio::fs::read(&output).await.unwrap();
        assert_eq!(copied, b"%PDF-1.5 test");
    }

    #[tokio::test]
    async fn mock_printer_assigns_sequential_ids() {
        let provider = MockProvider::default();
        let path = Path::new("/tmp/whatever.pdf");

        let first = provider.submit(path, "Office_Laser").await.unwrap();
        let second = provider.submit(path, "Office_Laser").await.unwrap();
        assert_eq!(first.id, "Office_Laser-1");
        assert_eq!(second.id, "Office_Laser-2");
    }
}
