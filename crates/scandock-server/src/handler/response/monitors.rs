//! Monitor response types.

use std::collections::BTreeMap;

use jiff::Timestamp;
use scandock_core::{ServiceHealth, ServiceStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Liveness status response.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Overall service health status.
    pub status: ServiceStatus,
    /// Application version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
}

impl MonitorStatus {
    /// Creates a healthy status snapshot for a server started at `started_at`.
    pub fn healthy_since(started_at: Timestamp) -> Self {
        let checked_at = Timestamp::now();
        let uptime = checked_at.duration_since(started_at);
        Self {
            status: ServiceStatus::Healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime.as_secs().max(0) as u64,
            checked_at,
        }
    }
}

/// Per-provider health report response.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersHealth {
    /// Worst status across all providers.
    pub status: ServiceStatus,
    /// Health details keyed by provider name.
    pub providers: BTreeMap<String, ServiceHealth>,
    /// Timestamp when the checks were performed.
    pub checked_at: Timestamp,
}

impl ProvidersHealth {
    /// Aggregates individual provider reports into one response.
    ///
    /// The overall status is the worst status found among the providers.
    pub fn from_reports(providers: BTreeMap<String, ServiceHealth>) -> Self {
        let status = providers
            .values()
            .map(|health| health.status)
            .max()
            .unwrap_or(ServiceStatus::Healthy);

        Self {
            status,
            providers,
            checked_at: Timestamp::now(),
        }
    }
}
