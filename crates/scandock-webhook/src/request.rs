//! Webhook delivery request and payload types.

use std::collections::HashMap;
use std::time::Duration;

use jiff::Timestamp;
use scandock_core::document::{Document, OcrStatus};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A webhook delivery request.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// The webhook endpoint URL.
    pub url: Url,
    /// The event type that triggered this webhook delivery.
    pub event: String,
    /// Human-readable message describing the event.
    pub message: String,
    /// Additional context about the event.
    pub context: WebhookContext,
    /// Custom headers to include in the request.
    pub headers: HashMap<String, String>,
    /// Secret for HMAC-SHA256 payload signing.
    pub secret: Option<String>,
    /// Optional request timeout (uses client default if not set).
    pub timeout: Option<Duration>,
}

impl WebhookRequest {
    /// Creates a new webhook request.
    pub fn new(
        url: Url,
        event: impl Into<String>,
        message: impl Into<String>,
        context: WebhookContext,
    ) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            url,
            event: event.into(),
            message: message.into(),
            context,
            headers: HashMap::new(),
            secret: None,
            timeout: None,
        }
    }

    /// Creates a completion request for a stored document.
    pub fn document_stored(url: Url, document: &Document) -> Self {
        let noun = if document.page_count == 1 {
            "page"
        } else {
            "pages"
        };
        let message = format!(
            "Scanned {} ({} {noun}) into {}",
            document.file_name, document.page_count, document.category
        );
        Self::new(
            url,
            crate::EVENT_DOCUMENT_STORED,
            message,
            WebhookContext::from(document),
        )
    }

    /// Creates a test request for webhook testing.
    pub fn test(url: Url) -> Self {
        Self::new(
            url,
            crate::EVENT_TEST,
            "This is a test webhook delivery",
            WebhookContext::test(),
        )
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Adds a custom header to the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Converts this request into a payload for serialization.
    pub fn into_payload(self) -> WebhookPayload {
        WebhookPayload {
            event: self.event,
            message: self.message,
            context: self.context,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a payload from this request without consuming it.
    pub fn to_payload(&self) -> WebhookPayload {
        WebhookPayload {
            event: self.event.clone(),
            message: self.message.clone(),
            context: self.context.clone(),
            timestamp: Timestamp::now(),
        }
    }
}

/// The webhook payload structure sent to webhook endpoints.
///
/// This payload is signed with HMAC-SHA256 when a webhook secret is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct WebhookPayload {
    /// The event type that triggered this webhook delivery.
    pub event: String,

    /// Human-readable message describing the event.
    pub message: String,

    /// Additional context about the event.
    pub context: WebhookContext,

    /// Timestamp when the payload was created.
    #[cfg_attr(feature = "schema", schemars(with = "String"))]
    pub timestamp: Timestamp,
}

/// Contextual data included with webhook payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct WebhookContext {
    /// The stored file name within its category directory.
    pub file_name: String,

    /// Category the document was filed under.
    pub category: String,

    /// Number of pages merged into the document.
    pub page_count: u32,

    /// Outcome of the OCR pass.
    pub ocr_status: OcrStatus,

    /// Additional event-specific metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl WebhookContext {
    /// Creates a new context with required fields.
    pub fn new(
        file_name: impl Into<String>,
        category: impl Into<String>,
        page_count: u32,
        ocr_status: OcrStatus,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            category: category.into(),
            page_count,
            ocr_status,
            metadata: serde_json::Value::Null,
        }
    }

    /// Creates a test context for webhook testing.
    pub fn test() -> Self {
        Self {
            file_name: "test.pdf".to_owned(),
            category: "test".to_owned(),
            page_count: 0,
            ocr_status: OcrStatus::None,
            metadata: serde_json::json!({
                "test": true
            }),
        }
    }

    /// Sets additional metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<&Document> for WebhookContext {
    fn from(document: &Document) -> Self {
        Self::new(
            document.file_name.clone(),
            document.category.clone(),
            document.page_count,
            document.ocr_status,
        )
        .with_metadata(serde_json::json!({
            "byte_len": document.byte_len,
            "created_at": document.created_at.to_string(),
        }))
    }
}
