//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust
//! use scandock_server::handler;
//! use scandock_server::middleware::{OpenApiConfig, RouterOpenApiExt};
//! use scandock_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::builder().build()?;
//! let state = ServiceState::from_config(config).await?;
//!
//! let app: axum::Router = handler::routes()
//!     .with_open_api(OpenApiConfig::default())
//!     .with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod documents;
mod error;
mod monitors;
mod printers;
pub mod request;
pub mod response;
mod scans;
mod sessions;
mod webhooks;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
///
/// Monitor routes stay at the root so probes reach them without the API
/// prefix; everything else lives under `/api`.
pub fn routes() -> ApiRouter<ServiceState> {
    let api_routes = ApiRouter::new()
        .merge(sessions::routes())
        .merge(scans::routes())
        .merge(documents::routes())
        .merge(printers::routes())
        .merge(webhooks::routes());

    ApiRouter::new()
        .merge(monitors::routes())
        .nest("/api", api_routes)
        .fallback(handler)
}
