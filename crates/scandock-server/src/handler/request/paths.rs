//! Path parameter types for HTTP handlers.
//!
//! Field names match the route captures, so these stay snake_case.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters for scan session operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionPathParams {
    /// Unique identifier of the scan session.
    pub session_id: Uuid,
}

/// Path parameters for stored document operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocumentPathParams {
    /// Category directory the document lives in.
    pub category: String,
    /// File name of the stored PDF.
    pub file_name: String,
}
