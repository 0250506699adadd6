//! HTTP/HTTPS server startup with lifecycle management.
//!
//! This module provides a clean API for starting HTTP and HTTPS servers with
//! enhanced error handling and graceful shutdown. It automatically handles
//! protocol selection based on the `tls` feature.

mod error;
#[cfg(not(feature = "tls"))]
mod http_server;
#[cfg(feature = "tls")]
mod https_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{ServerError, ServerResult};
#[cfg(not(feature = "tls"))]
use http_server::serve_http;
#[cfg(feature = "tls")]
use https_server::serve_https;
use shutdown::shutdown_signal;

use crate::config::ServerConfig;

/// Starts a server with automatic protocol selection (HTTP/HTTPS) based on configuration.
///
/// This is a convenience function that automatically chooses between HTTP and HTTPS
/// based on whether the `tls` feature is enabled.
///
/// # Arguments
///
/// * `app` - The Axum router to serve
/// * `config` - Server configuration that determines protocol and settings
///
/// # Errors
///
/// Returns an error if:
/// - TLS certificates cannot be loaded (HTTPS mode)
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
pub async fn serve(app: Router, config: ServerConfig) -> ServerResult<()> {
    #[cfg(feature = "tls")]
    {
        serve_https(app, config).await
    }

    #[cfg(not(feature = "tls"))]
    {
        serve_http(app, config).await
    }
}
