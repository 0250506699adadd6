//! Scan session request types.

use scandock_core::scan::{ColorMode, ScanOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for opening a new scan session.
///
/// Scan options are fixed at session creation and apply to every page
/// captured within the session. Omitted fields fall back to the configured
/// scanner defaults.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    /// Scan resolution in DPI (75-1200).
    #[validate(range(min = 75, max = 1200))]
    pub resolution: Option<u32>,
    /// Color mode for captured pages.
    pub color_mode: Option<ColorMode>,
}

impl CreateSession {
    /// Resolves the session's scan options against the configured defaults.
    pub fn scan_options(&self, defaults: ScanOptions) -> ScanOptions {
        ScanOptions {
            resolution: self.resolution.unwrap_or(defaults.resolution),
            color_mode: self.color_mode.unwrap_or(defaults.color_mode),
        }
    }
}

/// Request payload for finishing a scan session into a stored document.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinishSession {
    /// Category to file the finished document into (1-64 characters).
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    /// Base file name for the stored PDF, without extension (1-128 characters).
    /// A timestamped name is generated when omitted.
    #[validate(length(min = 1, max = 128))]
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_options_fall_back_to_defaults() {
        let request = CreateSession::default();
        let options = request.scan_options(ScanOptions::default());

        assert_eq!(options.resolution, 300);
        assert_eq!(options.color_mode, ColorMode::Color);
    }

    #[test]
    fn scan_options_prefer_request_values() {
        let request = CreateSession {
            resolution: Some(600),
            color_mode: Some(ColorMode::Grayscale),
        };
        let options = request.scan_options(ScanOptions::default());

        assert_eq!(options.resolution, 600);
        assert_eq!(options.color_mode, ColorMode::Grayscale);
    }

    #[test]
    fn resolution_out_of_range_fails_validation() {
        let request = CreateSession {
            resolution: Some(12_000),
            color_mode: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_category_fails_validation() {
        let request = FinishSession {
            category: String::new(),
            file_name: None,
        };

        assert!(request.validate().is_err());
    }
}
