//! Health monitoring handlers.
//!
//! Provides a liveness endpoint that never touches the pipeline and a
//! provider report that polls every configured backend.

use std::collections::BTreeMap;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use scandock_core::{ServiceHealth, ServiceStatus};

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::{MonitorStatus, ProvidersHealth};
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "scandock_server::handler::monitors";

/// Reports the server as alive.
///
/// Succeeds as long as the process accepts requests, regardless of scanner,
/// OCR, or spooler availability.
#[tracing::instrument(skip_all)]
async fn monitor_status(
    State(state): State<ServiceState>,
) -> Result<(StatusCode, Json<MonitorStatus>)> {
    let status = MonitorStatus::healthy_since(state.started_at);
    Ok((StatusCode::OK, Json(status)))
}

fn monitor_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Liveness")
        .description("Returns status, version, and uptime without touching any provider.")
        .response::<200, Json<MonitorStatus>>()
}

/// Polls every configured provider and aggregates the results.
///
/// Checks run concurrently. The response status is 503 when any provider
/// reports unhealthy; a degraded provider still answers 200.
#[tracing::instrument(skip_all)]
async fn providers_health(
    State(state): State<ServiceState>,
) -> Result<(StatusCode, Json<ProvidersHealth>)> {
    tracing::debug!(target: TRACING_TARGET, "Checking provider health");

    let (scanner, ocr, spooler, webhook) = tokio::join!(
        state.scanner.health_check(),
        state.ocr.health_check(),
        state.spooler.health_check(),
        state.notifier.health_check(),
    );

    let mut providers = BTreeMap::new();
    providers.insert("scanner".to_owned(), report(scanner));
    providers.insert("ocr".to_owned(), report(ocr));
    providers.insert("spooler".to_owned(), report(spooler));
    if let Some(result) = webhook {
        providers.insert("webhook".to_owned(), report(result));
    }

    let health = ProvidersHealth::from_reports(providers);
    let status_code = match health.status {
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    if status_code != StatusCode::OK {
        tracing::warn!(
            target: TRACING_TARGET,
            status = ?health.status,
            "Provider health check reported failures"
        );
    }

    Ok((status_code, Json(health)))
}

fn providers_health_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Provider health")
        .description(
            "Polls the scanner, OCR engine, print spooler, and webhook endpoint. \
             Responds 503 when any provider is unhealthy.",
        )
        .response::<200, Json<ProvidersHealth>>()
        .response::<503, Json<ProvidersHealth>>()
}

/// Folds a failed health call into an unhealthy report.
fn report(result: scandock_core::Result<ServiceHealth>) -> ServiceHealth {
    result.unwrap_or_else(|error| ServiceHealth::unhealthy(error.to_string()))
}

/// Returns routes for health monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(monitor_status, monitor_status_docs))
        .api_route(
            "/health/providers",
            get_with(providers_health, providers_health_docs),
        )
        .with_path_items(|item| item.tag("Monitors"))
}
