use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for webhook deliveries (in seconds).
pub const DEFAULT_HTTP_TIMEOUT: u64 = 30;

/// Configuration for the reqwest webhook client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Timeout for webhook deliveries (in seconds).
    #[cfg_attr(
        feature = "config",
        arg(long = "webhook-http-timeout", env = "WEBHOOK_HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,
    /// User agent presented on outgoing webhook requests.
    #[cfg_attr(
        feature = "config",
        arg(long = "webhook-user-agent", env = "WEBHOOK_USER_AGENT")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ReqwestConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configured delivery timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Returns the delivery timeout, falling back to the default when unset.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the user agent, falling back to the crate identity when unset.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("scandock/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Overrides the delivery timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout = seconds;
        self
    }

    /// Overrides the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_http_timeout(),
            user_agent: None,
        }
    }
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT
}
