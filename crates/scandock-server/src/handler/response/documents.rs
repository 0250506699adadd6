//! Stored document response types.

use axum::response::{IntoResponse, Response};
use axum_extra::response::Attachment;
use jiff::Timestamp;
use scandock_core::document::{Document, OcrStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::service::StoredEntry;

/// Response for a freshly stored document.
///
/// Returned by the finish and single-shot scan endpoints. The document's
/// location inside the storage root is addressed by category and file name,
/// never by filesystem path.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStored {
    /// File name of the stored PDF.
    pub file_name: String,
    /// Category directory the document was filed into.
    pub category: String,
    /// Number of pages in the document.
    pub page_count: u32,
    /// Outcome of the OCR pass.
    pub ocr_status: OcrStatus,
    /// Size of the stored PDF in bytes.
    pub byte_len: u64,
    /// Timestamp when the document was stored.
    pub created_at: Timestamp,
}

impl From<Document> for DocumentStored {
    fn from(document: Document) -> Self {
        Self {
            file_name: document.file_name,
            category: document.category,
            page_count: document.page_count,
            ocr_status: document.ocr_status,
            byte_len: document.byte_len,
            created_at: document.created_at,
        }
    }
}

/// A stored document as seen when browsing the archive.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    /// File name of the stored PDF.
    pub file_name: String,
    /// Category directory the document lives in.
    pub category: String,
    /// Size of the stored PDF in bytes.
    pub byte_len: u64,
    /// Timestamp of the last modification.
    pub modified_at: Timestamp,
}

impl From<StoredEntry> for DocumentEntry {
    fn from(entry: StoredEntry) -> Self {
        Self {
            file_name: entry.file_name,
            category: entry.category,
            byte_len: entry.byte_len,
            modified_at: entry.modified_at,
        }
    }
}

/// Response for listing stored documents.
pub type DocumentEntries = Vec<DocumentEntry>;

/// Response describing the configured category set.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing {
    /// Categories documents can be filed into.
    pub categories: Vec<String>,
    /// Whether unknown categories are created on demand.
    pub allow_ad_hoc: bool,
}

/// Binary download response for a stored PDF.
///
/// Responds with `application/pdf` and a `Content-Disposition` attachment
/// header carrying the document's file name.
#[must_use]
pub struct PdfAttachment {
    file_name: String,
    content: Vec<u8>,
}

impl PdfAttachment {
    /// Creates an attachment response for a stored document.
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

impl std::fmt::Debug for PdfAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfAttachment")
            .field("file_name", &self.file_name)
            .field("byte_len", &self.content.len())
            .finish()
    }
}

impl IntoResponse for PdfAttachment {
    fn into_response(self) -> Response {
        Attachment::new(self.content)
            .filename(self.file_name)
            .content_type("application/pdf")
            .into_response()
    }
}

impl aide::OperationOutput for PdfAttachment {
    type Inner = Self;

    fn operation_response(
        _ctx: &mut aide::generate::GenContext,
        _operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Some(aide::openapi::Response {
            description: "The stored PDF document".to_owned(),
            ..Default::default()
        })
    }

    fn inferred_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        match Self::operation_response(ctx, operation) {
            Some(response) => vec![(Some(200), response)],
            None => Vec::new(),
        }
    }
}
