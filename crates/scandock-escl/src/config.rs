//! eSCL client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use scandock_core::scan::{ColorMode, ScanOptions};
use serde::{Deserialize, Serialize};

/// Default timeout for scanner requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default scan resolution in DPI.
pub const DEFAULT_RESOLUTION: u32 = 300;

/// Configuration for the eSCL scanner client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EsclConfig {
    /// Scanner host name or IP address
    #[cfg_attr(
        feature = "config",
        arg(long = "scanner-host", env = "SCANNER_HOST", default_value = "192.168.1.100")
    )]
    #[serde(default = "default_host")]
    pub host: String,

    /// Scanner port
    #[cfg_attr(
        feature = "config",
        arg(long = "scanner-port", env = "SCANNER_PORT", default_value = "443")
    )]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS when talking to the scanner
    #[cfg_attr(
        feature = "config",
        arg(long = "scanner-https", env = "SCANNER_HTTPS", default_value = "true")
    )]
    #[serde(default = "default_https")]
    pub https: bool,

    /// Accept self-signed TLS certificates. Network scanners almost always
    /// present a self-signed certificate.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "scanner-accept-invalid-certs",
            env = "SCANNER_ACCEPT_INVALID_CERTS",
            default_value = "true"
        )
    )]
    #[serde(default = "default_https")]
    pub accept_invalid_certs: bool,

    /// Scanner request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "scanner-timeout", env = "SCANNER_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub scan_timeout: u64,

    /// Default scan resolution in DPI
    #[cfg_attr(
        feature = "config",
        arg(
            long = "scanner-resolution",
            env = "SCANNER_RESOLUTION",
            default_value = "300"
        )
    )]
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Default color mode (`color` or `grayscale`)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "scanner-color-mode",
            env = "SCANNER_COLOR_MODE",
            default_value = "color"
        )
    )]
    #[serde(default = "default_color_mode")]
    pub color_mode: String,
}

fn default_host() -> String {
    "192.168.1.100".to_owned()
}

fn default_port() -> u16 {
    443
}

fn default_https() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_resolution() -> u32 {
    DEFAULT_RESOLUTION
}

fn default_color_mode() -> String {
    "color".to_owned()
}

impl Default for EsclConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            https: default_https(),
            accept_invalid_certs: default_https(),
            scan_timeout: default_timeout_secs(),
            resolution: default_resolution(),
            color_mode: default_color_mode(),
        }
    }
}

impl EsclConfig {
    /// Returns the scanner base URL, e.g. `https://192.168.1.100:443`.
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout)
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.scan_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.scan_timeout)
        }
    }

    /// Returns the configured default color mode, falling back to color when
    /// the string form is not recognized.
    pub fn default_color_mode(&self) -> ColorMode {
        self.color_mode.parse().unwrap_or_default()
    }

    /// Builds the default scan options from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            resolution: self.resolution,
            color_mode: self.default_color_mode(),
        }
    }

    /// Sets the scanner host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the scanner port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets whether to use HTTPS.
    #[must_use]
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.scan_timeout = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EsclConfig::default();
        assert_eq!(config.base_url(), "https://192.168.1.100:443");
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert_eq!(config.default_color_mode(), ColorMode::Color);
    }

    #[test]
    fn http_base_url() {
        let config = EsclConfig::default()
            .with_host("10.0.0.5")
            .with_port(8080)
            .with_https(false);
        assert_eq!(config.base_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn effective_timeout_uses_default_when_zero() {
        let config = EsclConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn unknown_color_mode_falls_back_to_color() {
        let config = EsclConfig {
            color_mode: "sepia".to_owned(),
            ..Default::default()
        };
        assert_eq!(config.default_color_mode(), ColorMode::Color);
    }

    #[test]
    fn scan_options_reflect_config() {
        let config = EsclConfig {
            resolution: 600,
            color_mode: "grayscale".to_owned(),
            ..Default::default()
        };
        let options = config.scan_options();
        assert_eq!(options.resolution, 600);
        assert_eq!(options.color_mode, ColorMode::Grayscale);
    }
}
