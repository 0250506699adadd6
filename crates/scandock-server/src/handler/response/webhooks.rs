//! Webhook response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for an explicit webhook delivery test.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTestResult {
    /// Whether the endpoint acknowledged the delivery with a 2xx status.
    pub delivered: bool,
    /// HTTP status code returned by the endpoint.
    pub status_code: u16,
    /// ID of the delivery attempt, echoed in the signed request headers.
    pub request_id: Uuid,
}
