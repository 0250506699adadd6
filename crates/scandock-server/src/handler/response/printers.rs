//! Printer response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Response describing the print queues known to the spooler.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrinterListing {
    /// Names of the available print queues.
    pub printers: Vec<String>,
}

/// Response returned after a print job has been accepted by the spooler.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrintJobCreated {
    /// Spooler-assigned job identifier.
    pub job_id: String,
    /// Queue the job was submitted to.
    pub queue: String,
}
