use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use scandock_core::ocr::{BoxedOcrProvider, OcrOptions};
use scandock_core::print::BoxedPrintProvider;
use scandock_core::scan::{BoxedScannerProvider, ScanOptions};
use scandock_cups::{CupsConfig, CupsSpooler};
use scandock_escl::{EsclClient, EsclConfig};
use scandock_ocrmypdf::{OcrmypdfConfig, OcrmypdfEngine};
use scandock_webhook::reqwest::ReqwestConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::service::Notifier;

/// Default values for configuration options.
mod defaults {
    use std::path::PathBuf;

    /// Default root directory for finished documents.
    pub fn storage_root() -> PathBuf {
        "/data/scan".into()
    }

    /// Default category set.
    pub fn categories() -> Vec<String> {
        ["invoices", "receipts", "letters", "misc", "documents"]
            .map(str::to_owned)
            .to_vec()
    }

    /// Default idle expiry for scan sessions in seconds.
    pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 1800;

    /// Default interval between expiry sweeps in seconds.
    pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

    /// Default page cap per scan session.
    pub const SESSION_MAX_PAGES: u32 = 50;

    /// Default upper bound for print uploads: 50 MiB.
    pub const PRINT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

    /// Default extensions accepted for print uploads.
    pub fn print_allowed_types() -> Vec<String> {
        ["pdf", "jpg", "jpeg", "png", "txt"]
            .map(str::to_owned)
            .to_vec()
    }

    /// Default timeout for test webhook deliveries in seconds.
    pub const WEBHOOK_TEST_TIMEOUT_SECS: u64 = 10;
}

/// Storage layout for finished documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct StorageConfig {
    /// Root directory for finished documents
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-path", env = "STORAGE_PATH", default_value = "/data/scan")
    )]
    #[serde(default = "defaults::storage_root")]
    pub storage_root: PathBuf,

    /// Category directories documents may be filed under
    #[cfg_attr(
        feature = "config",
        arg(
            long = "categories",
            env = "CATEGORIES",
            value_delimiter = ',',
            default_value = "invoices,receipts,letters,misc,documents"
        )
    )]
    #[serde(default = "defaults::categories")]
    pub categories: Vec<String>,

    /// Accept categories outside the configured set, creating their
    /// directories on first use
    #[cfg_attr(
        feature = "config",
        arg(
            long = "allow-ad-hoc-categories",
            env = "ALLOW_AD_HOC_CATEGORIES",
            default_value = "false"
        )
    )]
    #[serde(default)]
    pub allow_ad_hoc_categories: bool,
}

impl StorageConfig {
    /// Returns the scratch directory holding in-flight session pages.
    pub fn scratch_root(&self) -> PathBuf {
        self.storage_root.join(".scratch")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_root: defaults::storage_root(),
            categories: defaults::categories(),
            allow_ad_hoc_categories: false,
        }
    }
}

/// Lifecycle limits for scan sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct SessionConfig {
    /// Seconds of inactivity after which a session expires
    #[cfg_attr(
        feature = "config",
        arg(
            long = "session-idle-timeout",
            env = "SESSION_IDLE_TIMEOUT",
            default_value = "1800"
        )
    )]
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Seconds between expiry sweeps
    #[cfg_attr(
        feature = "config",
        arg(
            long = "session-sweep-interval",
            env = "SESSION_SWEEP_INTERVAL",
            default_value = "60"
        )
    )]
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,

    /// Maximum pages a single session may hold
    #[cfg_attr(
        feature = "config",
        arg(
            long = "session-max-pages",
            env = "SESSION_MAX_PAGES",
            default_value = "50"
        )
    )]
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_idle_timeout() -> u64 {
    defaults::SESSION_IDLE_TIMEOUT_SECS
}

fn default_sweep_interval() -> u64 {
    defaults::SESSION_SWEEP_INTERVAL_SECS
}

fn default_max_pages() -> u32 {
    defaults::SESSION_MAX_PAGES
}

impl SessionConfig {
    /// Returns the idle expiry as a Duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    /// Returns the sweep interval as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: default_idle_timeout(),
            sweep_interval: default_sweep_interval(),
            max_pages: default_max_pages(),
        }
    }
}

/// Validation limits for print uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct PrintConfig {
    /// Largest accepted upload in bytes
    #[cfg_attr(
        feature = "config",
        arg(
            long = "print-max-upload-bytes",
            env = "PRINT_MAX_UPLOAD_BYTES",
            default_value = "52428800"
        )
    )]
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// File extensions accepted for print uploads
    #[cfg_attr(
        feature = "config",
        arg(
            long = "print-allowed-types",
            env = "PRINT_ALLOWED_TYPES",
            value_delimiter = ',',
            default_value = "pdf,jpg,jpeg,png,txt"
        )
    )]
    #[serde(default = "defaults::print_allowed_types")]
    pub allowed_types: Vec<String>,
}

fn default_max_upload_bytes() -> u64 {
    defaults::PRINT_MAX_UPLOAD_BYTES
}

impl PrintConfig {
    /// Checks a file name against the allowed extension set.
    ///
    /// The comparison is case-insensitive; a name without an extension is
    /// never allowed.
    pub fn is_allowed_type(&self, file_name: &str) -> bool {
        let Some((stem, extension)) = file_name.rsplit_once('.') else {
            return false;
        };
        if stem.is_empty() || extension.is_empty() {
            return false;
        }
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            allowed_types: defaults::print_allowed_types(),
        }
    }
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct NotifierConfig {
    /// Endpoint notified when a document is stored. Unset disables
    /// notifications entirely.
    #[cfg_attr(feature = "config", arg(long = "webhook-url", env = "WEBHOOK_URL"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<Url>,

    /// Shared secret for HMAC payload signatures
    #[cfg_attr(
        feature = "config",
        arg(long = "webhook-secret", env = "WEBHOOK_SECRET")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,

    /// Timeout for explicit test deliveries in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "webhook-test-timeout",
            env = "WEBHOOK_TEST_TIMEOUT",
            default_value = "10"
        )
    )]
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,

    /// Delivery transport options
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub transport: ReqwestConfig,
}

fn default_test_timeout() -> u64 {
    defaults::WEBHOOK_TEST_TIMEOUT_SECS
}

impl NotifierConfig {
    /// Returns the test delivery timeout as a Duration.
    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_secret: None,
            test_timeout: default_test_timeout(),
            transport: ReqwestConfig::default(),
        }
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Scanner endpoint and default scan options.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub scanner: EsclConfig,

    /// OCR engine invocation options.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub ocr: OcrmypdfConfig,

    /// Print spooler invocation options.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub spooler: CupsConfig,

    /// Document storage layout.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scan session lifecycle limits.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Print upload validation limits.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub print: PrintConfig,

    /// Webhook notification settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Creates the eSCL scanner backend described by this configuration.
    pub fn create_scanner(&self) -> BoxedScannerProvider {
        Arc::new(EsclClient::new(self.scanner.clone()))
    }

    /// Creates the ocrmypdf backend described by this configuration.
    pub fn create_ocr(&self) -> BoxedOcrProvider {
        Arc::new(OcrmypdfEngine::new(self.ocr.clone()))
    }

    /// Creates the CUPS spooler backend described by this configuration.
    pub fn create_spooler(&self) -> BoxedPrintProvider {
        Arc::new(CupsSpooler::new(self.spooler.clone()))
    }

    /// Creates the notifier described by this configuration.
    ///
    /// The notifier is disabled when no webhook URL is configured.
    pub fn create_notifier(&self) -> Notifier {
        Notifier::from_config(&self.notifier)
    }

    /// Returns the scan options applied when a request leaves them unset.
    pub fn default_scan_options(&self) -> ScanOptions {
        self.scanner.scan_options()
    }

    /// Returns the OCR options forwarded to the engine.
    pub fn ocr_options(&self) -> OcrOptions {
        self.ocr.ocr_options()
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        // Validate session lifecycle limits
        if let Some(sessions) = &builder.sessions {
            if sessions.max_pages == 0 {
                return Err("Session page limit must be greater than 0".to_string());
            }
            if sessions.sweep_interval == 0 {
                return Err("Session sweep interval must be at least 1 second".to_string());
            }
            if sessions.idle_timeout < sessions.sweep_interval {
                return Err(
                    "Session idle timeout cannot be shorter than the sweep interval".to_string(),
                );
            }
        }

        // Validate storage layout
        if let Some(storage) = &builder.storage {
            if storage.categories.is_empty() {
                return Err("At least one category must be configured".to_string());
            }

            for category in &storage.categories {
                if category.is_empty()
                    || category.contains(['/', '\\'])
                    || category.starts_with('.')
                {
                    return Err(format!(
                        "Category '{category}' is not a valid directory name"
                    ));
                }
            }
        }

        // Validate print upload limits
        if let Some(print) = &builder.print
            && print.max_upload_bytes == 0
        {
            return Err("Print upload limit must be greater than 0".to_string());
        }

        // Validate OCR options
        if let Some(ocr) = &builder.ocr {
            if ocr.optimize > 3 {
                return Err("OCR optimize level cannot exceed 3".to_string());
            }
            if ocr.language.is_empty() {
                return Err("OCR language cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(debug_assertions)]
impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scanner: EsclConfig::default(),
            ocr: OcrmypdfConfig::default(),
            spooler: CupsConfig::default(),
            storage: StorageConfig::default(),
            sessions: SessionConfig::default(),
            print: PrintConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_with_defaults() {
        let config = ServiceConfig::builder().build().unwrap();
        assert_eq!(config.sessions.max_pages, 50);
        assert_eq!(config.storage.categories.len(), 5);
        assert_eq!(config.print.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.notifier.webhook_url.is_none());
    }

    #[test]
    fn builder_rejects_zero_page_limit() {
        let result = ServiceConfig::builder()
            .with_sessions(SessionConfig {
                max_pages: 0,
                ..SessionConfig::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_empty_categories() {
        let result = ServiceConfig::builder()
            .with_storage(StorageConfig {
                categories: Vec::new(),
                ..StorageConfig::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_traversal_category() {
        let result = ServiceConfig::builder()
            .with_storage(StorageConfig {
                categories: vec!["invoices".to_owned(), "../etc".to_owned()],
                ..StorageConfig::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn scratch_root_lives_under_storage_root() {
        let storage = StorageConfig {
            storage_root: "/srv/docs".into(),
            ..StorageConfig::default()
        };
        assert_eq!(storage.scratch_root(), PathBuf::from("/srv/docs/.scratch"));
    }

    #[test]
    fn allowed_type_check_is_case_insensitive() {
        let print = PrintConfig::default();
        assert!(print.is_allowed_type("report.pdf"));
        assert!(print.is_allowed_type("photo.JPG"));
        assert!(print.is_allowed_type("notes.tar.txt"));
        assert!(!print.is_allowed_type("binary.exe"));
        assert!(!print.is_allowed_type("no_extension"));
        assert!(!print.is_allowed_type(".hidden"));
    }
}
