//! Domain model for scanned pages and stored documents.

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Image container format of a scanned page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PageFormat {
    /// JPEG/JFIF image.
    Jpeg,
    /// PNG image.
    Png,
}

impl PageFormat {
    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Detects the format from the leading magic bytes of a payload.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else {
            None
        }
    }

    /// Resolves the format from a MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// A single scanned page held in the session scratch area.
///
/// Written once by the scan invoker and read-only afterwards; the file is
/// deleted after assembly succeeds or when its session expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based position within the session, in append order.
    pub number: u32,
    /// Location of the page image in the scratch area.
    pub path: PathBuf,
    /// Raw payload length in bytes.
    pub byte_len: u64,
    /// Image container format.
    pub format: PageFormat,
}

/// OCR outcome recorded on a stored document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OcrStatus {
    /// OCR was not requested for this document.
    #[default]
    None,
    /// OCR is in flight.
    Pending,
    /// A searchable text layer was produced.
    Done,
    /// The OCR engine failed; the document is stored without a text layer.
    Failed,
}

/// A finished document stored under a category directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name within the category directory, unique at write time.
    pub file_name: String,
    /// Absolute location of the stored file.
    pub path: PathBuf,
    /// Category directory the document was filed under.
    pub category: String,
    /// Number of pages merged into the document.
    pub page_count: u32,
    /// Outcome of the OCR pass.
    pub ocr_status: OcrStatus,
    /// Stored file length in bytes.
    pub byte_len: u64,
    /// When the final write completed.
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_detects_jpeg_and_png() {
        assert_eq!(
            PageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(PageFormat::Jpeg)
        );
        assert_eq!(
            PageFormat::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            Some(PageFormat::Png)
        );
        assert_eq!(PageFormat::sniff(b"%PDF-1.5"), None);
        assert_eq!(PageFormat::sniff(&[]), None);
    }

    #[test]
    fn format_strings() {
        assert_eq!(PageFormat::Jpeg.extension(), "jpg");
        assert_eq!(PageFormat::Jpeg.mime(), "image/jpeg");
        assert_eq!(PageFormat::from_mime("image/jpg"), Some(PageFormat::Jpeg));
        assert_eq!(PageFormat::from_mime("application/pdf"), None);
    }

    #[test]
    fn ocr_status_serializes_snake_case() {
        let json = serde_json::to_string(&OcrStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        assert_eq!(OcrStatus::default(), OcrStatus::None);
    }
}
