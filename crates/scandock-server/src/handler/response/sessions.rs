//! Scan session response types.

use jiff::Timestamp;
use scandock_core::document::{Page, PageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::{ScanSession, SessionStatus};

/// Response returned when a new scan session is opened.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    /// ID of the new session.
    pub session_id: Uuid,
    /// Lifecycle state of the session.
    pub status: SessionStatus,
    /// Timestamp when the session was opened.
    pub created_at: Timestamp,
}

impl From<&ScanSession> for SessionCreated {
    fn from(session: &ScanSession) -> Self {
        Self {
            session_id: session.session_id,
            status: session.status,
            created_at: session.created_at,
        }
    }
}

/// A single captured page within a session.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    /// 1-based position of the page within the session.
    pub page_number: u32,
    /// Size of the page image in bytes.
    pub byte_len: u64,
    /// Container format of the page image.
    pub format: PageFormat,
}

impl From<&Page> for PageView {
    fn from(page: &Page) -> Self {
        Self {
            page_number: page.number,
            byte_len: page.byte_len,
            format: page.format,
        }
    }
}

/// Full session state response.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// ID of the session.
    pub session_id: Uuid,
    /// Lifecycle state of the session.
    pub status: SessionStatus,
    /// Number of pages captured so far.
    pub page_count: u32,
    /// Captured pages in scan order.
    pub pages: Vec<PageView>,
    /// Timestamp when the session was opened.
    pub created_at: Timestamp,
    /// Timestamp of the last page append or state change.
    pub last_activity: Timestamp,
}

impl From<&ScanSession> for SessionView {
    fn from(session: &ScanSession) -> Self {
        Self {
            session_id: session.session_id,
            status: session.status,
            page_count: session.pages.len() as u32,
            pages: session.pages.iter().map(PageView::from).collect(),
            created_at: session.created_at,
            last_activity: session.last_activity,
        }
    }
}

/// Response returned after a page has been scanned into a session.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageScanned {
    /// ID of the session the page was appended to.
    pub session_id: Uuid,
    /// 1-based number assigned to the new page.
    pub page_number: u32,
    /// Total number of pages in the session after the append.
    pub page_count: u32,
}

/// Response returned when a session is discarded.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDiscarded {
    /// ID of the discarded session.
    pub session_id: Uuid,
    /// Number of captured pages that were thrown away.
    pub pages_discarded: u32,
}
