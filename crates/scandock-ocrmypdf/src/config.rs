//! OCR engine configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use scandock_core::ocr::OcrOptions;
use serde::{Deserialize, Serialize};

/// Default timeout for one OCR run: 300 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the ocrmypdf engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OcrmypdfConfig {
    /// Whether finished documents get an OCR pass at all
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-enabled", env = "OCR_ENABLED", default_value = "true")
    )]
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Name or path of the ocrmypdf executable
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-binary", env = "OCR_BINARY", default_value = "ocrmypdf")
    )]
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Maximum seconds one OCR run may take
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-timeout", env = "OCR_TIMEOUT", default_value = "300")
    )]
    #[serde(default = "default_timeout_secs")]
    pub ocr_timeout: u64,

    /// Recognition language (ISO 639-3)
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-language", env = "OCR_LANGUAGE", default_value = "eng")
    )]
    #[serde(default = "default_language")]
    pub language: String,

    /// Straighten skewed pages before recognition
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-deskew", env = "OCR_DESKEW", default_value = "true")
    )]
    #[serde(default = "default_enabled")]
    pub deskew: bool,

    /// Clean scan artifacts before recognition
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-clean", env = "OCR_CLEAN", default_value = "true")
    )]
    #[serde(default = "default_enabled")]
    pub clean: bool,

    /// Output optimization level, 0 to 3
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-optimize", env = "OCR_OPTIMIZE", default_value = "3")
    )]
    #[serde(default = "default_optimize")]
    pub optimize: u8,
}

fn default_enabled() -> bool {
    true
}

fn default_binary() -> String {
    "ocrmypdf".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_language() -> String {
    "eng".to_owned()
}

fn default_optimize() -> u8 {
    3
}

impl Default for OcrmypdfConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            binary: default_binary(),
            ocr_timeout: default_timeout_secs(),
            language: default_language(),
            deskew: default_enabled(),
            clean: default_enabled(),
            optimize: default_optimize(),
        }
    }
}

impl OcrmypdfConfig {
    /// Returns the run timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout)
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.ocr_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.ocr_timeout)
        }
    }

    /// Builds the default OCR options from this configuration.
    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            language: self.language.clone(),
            deskew: self.deskew,
            clean: self.clean,
            optimize: self.optimize,
        }
    }

    /// Sets the executable name or path.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the run timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.ocr_timeout = timeout_secs;
        self
    }

    /// Enables or disables the OCR pass.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = OcrmypdfConfig::default();
        assert!(config.enabled);
        assert_eq!(config.binary, "ocrmypdf");
        assert_eq!(config.effective_timeout(), Duration::from_secs(300));
        assert!(config.ocr_options().validate().is_ok());
    }

    #[test]
    fn effective_timeout_uses_default_when_zero() {
        let config = OcrmypdfConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn ocr_options_reflect_config() {
        let config = OcrmypdfConfig {
            language: "deu".to_owned(),
            deskew: false,
            clean: false,
            optimize: 1,
            ..Default::default()
        };
        let options = config.ocr_options();
        assert_eq!(options.language, "deu");
        assert!(!options.deskew);
        assert!(!options.clean);
        assert_eq!(options.optimize, 1);
    }
}
