//! Print spooler abstractions.
//!
//! The print backend submits files to a named queue and lists the queues the
//! spooler knows about. Upload validation (size, file type) happens before a
//! file ever reaches this boundary.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ServiceHealth;
pub use crate::{Error, ErrorKind, Result};

/// Type alias for a shared print provider trait object.
pub type BoxedPrintProvider = Arc<dyn PrintProvider>;

/// Tracing target for print spooler operations.
pub const TRACING_TARGET: &str = "scandock_core::print";

/// A job accepted by the print spooler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct PrintJob {
    /// Spooler-assigned job identifier.
    pub id: String,
    /// Queue the job was submitted to.
    pub queue: String,
}

/// Core trait for print spooler backends.
#[async_trait::async_trait]
pub trait PrintProvider: Send + Sync {
    /// Lists the queue names known to the spooler.
    async fn queues(&self) -> Result<Vec<String>>;

    /// Submits `path` to the named queue.
    ///
    /// Failures categorize as `queue_unreachable` (spooler missing or not
    /// responding) or `rejected` (spooler refused the job).
    async fn submit(&self, path: &Path, queue: &str) -> Result<PrintJob>;

    /// Perform a health check on the print spooler.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
