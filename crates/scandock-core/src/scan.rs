//! Scanner acquisition abstractions.
//!
//! This module defines the capability trait for network scanner backends and
//! the option types carried by a single-page acquisition request. Concrete
//! implementations live in backend crates; the orchestration layer only sees
//! this interface.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::ServiceHealth;
use crate::document::PageFormat;
pub use crate::{Error, ErrorKind, Result};

/// Type alias for a shared scanner provider trait object.
pub type BoxedScannerProvider = Arc<dyn ScannerProvider>;

/// Tracing target for scanner operations.
pub const TRACING_TARGET: &str = "scandock_core::scan";

/// Color mode requested from the scanner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorMode {
    /// 24-bit color.
    #[default]
    Color,
    /// 8-bit grayscale.
    Grayscale,
}

/// Options for a single-page acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ScanOptions {
    /// Scan resolution in DPI.
    pub resolution: u32,
    /// Requested color mode.
    pub color_mode: ColorMode,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            resolution: 300,
            color_mode: ColorMode::default(),
        }
    }
}

/// A page image as received from the scanner.
#[derive(Debug, Clone)]
pub struct ScannedImage {
    /// Raw image payload.
    pub bytes: Bytes,
    /// Detected container format of the payload.
    pub format: PageFormat,
}

impl ScannedImage {
    /// Wraps a raw payload, detecting the format from its magic bytes.
    ///
    /// Fails with [`ErrorKind::ScannerProtocol`] when the payload is empty or
    /// not a recognized image format.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        let format = PageFormat::sniff(&bytes)
            .ok_or_else(|| Error::scanner_protocol().with_message("unrecognized image payload"))?;
        Ok(Self { bytes, format })
    }
}

/// Core trait for scanner acquisition.
///
/// Implementations issue one scan request to the configured device and return
/// the raw page image. Retry policy belongs to the caller; implementations
/// must not retry internally.
#[async_trait::async_trait]
pub trait ScannerProvider: Send + Sync {
    /// Acquires a single page from the scanner.
    ///
    /// Any non-success response, timeout, or malformed payload surfaces as a
    /// typed scanner error (`unreachable`, `timeout`, `protocol_error`,
    /// `busy`).
    async fn scan_page(&self, options: &ScanOptions) -> Result<ScannedImage>;

    /// Perform a health check on the scanner endpoint.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
