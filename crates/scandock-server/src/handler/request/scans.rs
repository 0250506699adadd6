//! Single-shot scan request types.

use scandock_core::scan::{ColorMode, ScanOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for a one-page scan-to-document operation.
///
/// Captures a single page and runs it through the same assemble, OCR, and
/// store pipeline as a finished session.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScan {
    /// Category to file the document into (1-64 characters).
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    /// Base file name for the stored PDF, without extension (1-128 characters).
    /// A timestamped name is generated when omitted.
    #[validate(length(min = 1, max = 128))]
    pub file_name: Option<String>,
    /// Scan resolution in DPI (75-1200).
    #[validate(range(min = 75, max = 1200))]
    pub resolution: Option<u32>,
    /// Color mode for the captured page.
    pub color_mode: Option<ColorMode>,
}

impl CreateScan {
    /// Resolves the scan options against the configured defaults.
    pub fn scan_options(&self, defaults: ScanOptions) -> ScanOptions {
        ScanOptions {
            resolution: self.resolution.unwrap_or(defaults.resolution),
            color_mode: self.color_mode.unwrap_or(defaults.color_mode),
        }
    }
}
