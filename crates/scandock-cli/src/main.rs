#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use scandock_server::handler;
use scandock_server::middleware::{
    RouterCorsExt, RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt,
};
use scandock_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "scandock_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "scandock_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "scandock_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.validate()?;
    cli.log();

    let state = ServiceState::from_config(cli.service.clone())
        .await
        .context("failed to initialize services")?;
    let _sweeper = state.sessions.spawn_sweeper();

    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server).await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. CORS - cross-origin headers
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    // Print uploads must fit within the request body limit, which axum
    // otherwise caps at 2 MiB. The slack covers multipart framing.
    let body_limit = state.config.print.max_upload_bytes.saturating_add(64 * 1024);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    handler::routes()
        .with_open_api(middleware.openapi.clone())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_cors(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
