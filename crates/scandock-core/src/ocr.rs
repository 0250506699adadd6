//! OCR post-processing abstractions.
//!
//! The OCR engine takes an assembled document and produces a searchable
//! variant. The pipeline treats it as best-effort: a failure here is recorded
//! on the stored document, never propagated as a pipeline failure.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ServiceHealth;
pub use crate::{Error, ErrorKind, Result};

/// Type alias for a shared OCR provider trait object.
pub type BoxedOcrProvider = Arc<dyn OcrProvider>;

/// Tracing target for OCR operations.
pub const TRACING_TARGET: &str = "scandock_core::ocr";

/// Highest supported optimization level.
pub const MAX_OPTIMIZE_LEVEL: u8 = 3;

/// Options forwarded to the OCR engine.
///
/// Fields map directly to engine flags; `optimize` is an ordinal trading file
/// size for processing time and is only range-checked, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct OcrOptions {
    /// Recognition language passed to the engine (ISO 639-3, e.g. `eng`).
    pub language: String,
    /// Straighten skewed pages before recognition.
    pub deskew: bool,
    /// Clean scan artifacts before recognition.
    pub clean: bool,
    /// Output optimization level, `0..=3`.
    pub optimize: u8,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_owned(),
            deskew: true,
            clean: true,
            optimize: MAX_OPTIMIZE_LEVEL,
        }
    }
}

impl OcrOptions {
    /// Validates option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.optimize > MAX_OPTIMIZE_LEVEL {
            return Err(Error::invalid_input().with_message(format!(
                "optimize level {} exceeds maximum {}",
                self.optimize, MAX_OPTIMIZE_LEVEL
            )));
        }
        if self.language.is_empty() {
            return Err(Error::invalid_input().with_message("ocr language must not be empty"));
        }
        Ok(())
    }
}

/// Core trait for OCR engines.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Produces a searchable variant of `input` at `output`.
    ///
    /// `input` may be a raster image or an existing PDF; implementations
    /// choose their text-layer strategy accordingly. The call applies a
    /// bounded timeout and reports overruns as [`ErrorKind::OcrFailed`].
    async fn process(&self, input: &Path, output: &Path, options: &OcrOptions) -> Result<()>;

    /// Perform a health check on the OCR engine.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(OcrOptions::default().validate().is_ok());
    }

    #[test]
    fn optimize_level_is_range_checked() {
        let options = OcrOptions {
            optimize: 4,
            ..Default::default()
        };
        let kind = options.validate().err().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn empty_language_is_rejected() {
        let options = OcrOptions {
            language: String::new(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
