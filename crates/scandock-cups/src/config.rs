//! CUPS spooler configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for spooler commands: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the CUPS spooler backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CupsConfig {
    /// Name or path of the lp executable
    #[cfg_attr(
        feature = "config",
        arg(long = "lp-binary", env = "LP_BINARY", default_value = "lp")
    )]
    #[serde(default = "default_lp_binary")]
    pub lp_binary: String,

    /// Name or path of the lpstat executable
    #[cfg_attr(
        feature = "config",
        arg(long = "lpstat-binary", env = "LPSTAT_BINARY", default_value = "lpstat")
    )]
    #[serde(default = "default_lpstat_binary")]
    pub lpstat_binary: String,

    /// Spooler command timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "spooler-timeout", env = "SPOOLER_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub spooler_timeout: u64,
}

fn default_lp_binary() -> String {
    "lp".to_owned()
}

fn default_lpstat_binary() -> String {
    "lpstat".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for CupsConfig {
    fn default() -> Self {
        Self {
            lp_binary: default_lp_binary(),
            lpstat_binary: default_lpstat_binary(),
            spooler_timeout: default_timeout_secs(),
        }
    }
}

impl CupsConfig {
    /// Returns the command timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.spooler_timeout)
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.spooler_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.spooler_timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CupsConfig::default();
        assert_eq!(config.lp_binary, "lp");
        assert_eq!(config.lpstat_binary, "lpstat");
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn effective_timeout_uses_default_when_zero() {
        let config = CupsConfig {
            spooler_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
