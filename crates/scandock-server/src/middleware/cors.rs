//! Cross-origin resource sharing middleware.
//!
//! The scanner station UI is typically served from the same host, but a
//! kiosk frontend or home automation dashboard may call the API from a
//! different origin. With no origins configured the API answers any origin
//! without credentials; configuring an explicit origin list narrows the
//! policy and optionally allows credentialed requests.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Tracing target for CORS policy construction.
const TRACING_TARGET: &str = "scandock_server::middleware::cors";

/// Configuration for the cross-origin policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// Origins allowed to call the API. When empty, any origin is allowed
    /// without credentials.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cors-origins",
            env = "CORS_ALLOWED_ORIGINS",
            value_delimiter = ','
        )
    )]
    pub allowed_origins: Vec<String>,

    /// Allow credentialed cross-origin requests. Only honored together with
    /// an explicit origin list.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cors-allow-credentials",
            env = "CORS_ALLOW_CREDENTIALS",
            default_value = "false"
        )
    )]
    pub allow_credentials: bool,

    /// Preflight response cache lifetime in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "cors-max-age", env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Builds the [`CorsLayer`] described by this configuration.
    ///
    /// Origins that do not parse as header values are skipped with a warning
    /// rather than failing startup.
    fn to_layer(&self) -> CorsLayer {
        if self.allowed_origins.is_empty() {
            return CorsLayer::permissive().max_age(Duration::from_secs(self.max_age));
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        origin = origin.as_str(),
                        "skipping origin that is not a valid header value"
                    );
                    None
                }
            })
            .collect();

        let layer = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(Duration::from_secs(self.max_age));

        if self.allow_credentials {
            layer.allow_credentials(true)
        } else {
            layer
        }
    }
}

/// Extension trait for `axum::`[`Router`] to apply the cross-origin policy.
pub trait RouterCorsExt<S> {
    /// Layers the CORS policy described by `config`.
    fn with_cors(self, config: &CorsConfig) -> Self;
}

impl<S> RouterCorsExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_cors(self, config: &CorsConfig) -> Self {
        self.layer(config.to_layer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_open() {
        let config = CorsConfig::default();
        assert!(config.allowed_origins.is_empty());
        assert!(!config.allow_credentials);
    }

    #[test]
    fn explicit_origins_build_a_layer() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://dashboard.local".to_owned(),
                "not a header\nvalue".to_owned(),
            ],
            allow_credentials: true,
            max_age: 600,
        };
        // Invalid origins are filtered out instead of panicking.
        let _ = config.to_layer();
    }
}
