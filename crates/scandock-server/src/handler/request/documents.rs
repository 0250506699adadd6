//! Stored document request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Query parameters for browsing stored documents.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    /// Restricts the listing to a single category.
    pub category: Option<String>,
}
