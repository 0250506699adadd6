//! Reqwest-based eSCL protocol client.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use scandock_core::scan::{ColorMode, ScanOptions, ScannedImage, ScannerProvider};
use scandock_core::{Error as CoreError, Result as CoreResult, ServiceHealth};

use super::{EsclConfig, Error, TRACING_TARGET};

/// Inner client that holds the HTTP client and configuration.
struct EsclClientInner {
    http: Client,
    config: EsclConfig,
}

/// eSCL protocol client for acquiring pages from a network scanner.
///
/// This client implements the [`ScannerProvider`] trait. One acquisition is
/// three protocol steps: create a scan job, fetch its `NextDocument`
/// resource, delete the job.
///
/// # Examples
///
/// ```rust,ignore
/// use scandock_core::scan::{ScanOptions, ScannerProvider};
/// use scandock_escl::{EsclClient, EsclConfig};
///
/// let client = EsclClient::new(EsclConfig::default());
/// let image = client.scan_page(&ScanOptions::default()).await?;
/// ```
#[derive(Clone)]
pub struct EsclClient {
    inner: Arc<EsclClientInner>,
}

impl std::fmt::Debug for EsclClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsclClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl EsclClient {
    /// Creates a new eSCL client with the given configuration.
    pub fn new(config: EsclConfig) -> Self {
        let timeout = config.effective_timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            timeout_ms = timeout.as_millis(),
            "Creating eSCL client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .expect("failed to create HTTP client");

        let inner = EsclClientInner { http, config };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &EsclConfig {
        &self.inner.config
    }

    /// Creates a scan job and returns its absolute job URL.
    async fn create_job(&self, options: &ScanOptions) -> CoreResult<String> {
        let base = self.config().base_url();
        let response = self
            .http()
            .post(format!("{base}/eSCL/ScanJobs"))
            .header(CONTENT_TYPE, "text/xml")
            .body(scan_settings(options))
            .send()
            .await
            .map_err(|e| CoreError::from(Error::from(e)))?;

        let status = response.status();
        match status {
            StatusCode::CREATED => {}
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::CONFLICT => {
                return Err(CoreError::scanner_busy()
                    .with_message(format!("scanner refused the job with status {status}")));
            }
            _ => {
                return Err(CoreError::scanner_protocol()
                    .with_message(format!("unexpected status {status} creating scan job")));
            }
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                CoreError::scanner_protocol().with_message("scan job response without location")
            })?;

        Ok(resolve_location(&base, location))
    }

    /// Fetches the page image from a scan job.
    async fn fetch_document(&self, job_url: &str) -> CoreResult<ScannedImage> {
        let response = self
            .http()
            .get(format!("{job_url}/NextDocument"))
            .send()
            .await
            .map_err(|e| CoreError::from(Error::from(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::scanner_protocol()
                .with_message(format!("unexpected status {status} fetching scanned page")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::from(Error::from(e)))?;
        if bytes.is_empty() {
            return Err(CoreError::scanner_protocol().with_message("scanner returned an empty page"));
        }

        ScannedImage::from_bytes(bytes)
    }

    /// Deletes a finished scan job. Best effort; the page is already ours.
    async fn delete_job(&self, job_url: &str) {
        if let Err(e) = self.http().delete(job_url).send().await {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %e,
                job_url,
                "Failed to delete scan job"
            );
        }
    }
}

#[async_trait::async_trait]
impl ScannerProvider for EsclClient {
    async fn scan_page(&self, options: &ScanOptions) -> CoreResult<ScannedImage> {
        tracing::debug!(
            target: TRACING_TARGET,
            resolution = options.resolution,
            color_mode = %options.color_mode,
            "Requesting page from scanner"
        );

        let job_url = self.create_job(options).await?;
        let image = self.fetch_document(&job_url).await;
        self.delete_job(&job_url).await;

        let image = image?;
        tracing::debug!(
            target: TRACING_TARGET,
            bytes = image.bytes.len(),
            format = %image.format,
            "Page received from scanner"
        );

        Ok(image)
    }

    async fn health_check(&self) -> CoreResult<ServiceHealth> {
        let base = self.config().base_url();
        let started = Instant::now();

        match self
            .http()
            .get(format!("{base}/eSCL/ScannerStatus"))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                Ok(ServiceHealth::healthy().with_response_time(started.elapsed()))
            }
            Ok(response) => Ok(ServiceHealth::degraded(format!(
                "scanner status endpoint returned {}",
                response.status()
            ))
            .with_response_time(started.elapsed())),
            Err(e) => Ok(ServiceHealth::unhealthy(format!(
                "scanner unreachable: {e}"
            ))),
        }
    }
}

/// Builds the eSCL `ScanSettings` document for one acquisition.
fn scan_settings(options: &ScanOptions) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<scan:ScanSettings xmlns:scan="http://schemas.hp.com/imaging/escl/2011/05/03" xmlns:pwg="http://www.pwg.org/schemas/2010/12/sm">
  <pwg:Version>2.0</pwg:Version>
  <scan:Intent>Document</scan:Intent>
  <pwg:InputSource>Platen</pwg:InputSource>
  <scan:ColorMode>{color_mode}</scan:ColorMode>
  <scan:XResolution>{resolution}</scan:XResolution>
  <scan:YResolution>{resolution}</scan:YResolution>
  <pwg:DocumentFormat>image/jpeg</pwg:DocumentFormat>
</scan:ScanSettings>"#,
        color_mode = escl_color_mode(options.color_mode),
        resolution = options.resolution,
    )
}

/// Maps a color mode to its eSCL token.
fn escl_color_mode(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Color => "RGB24",
        ColorMode::Grayscale => "Grayscale8",
    }
}

/// Resolves the `Location` header of a created job against the scanner base.
///
/// Scanners answer with either an absolute URL or an absolute path.
fn resolve_location(base: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        location.trim_end_matches('/').to_owned()
    } else {
        format!("{}/{}", base, location.trim_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_carry_resolution_and_color_mode() {
        let body = scan_settings(&ScanOptions {
            resolution: 600,
            color_mode: ColorMode::Grayscale,
        });

        assert!(body.contains("<scan:XResolution>600</scan:XResolution>"));
        assert!(body.contains("<scan:YResolution>600</scan:YResolution>"));
        assert!(body.contains("<scan:ColorMode>Grayscale8</scan:ColorMode>"));
        assert!(body.contains("image/jpeg"));
    }

    #[test]
    fn color_mode_tokens() {
        assert_eq!(escl_color_mode(ColorMode::Color), "RGB24");
        assert_eq!(escl_color_mode(ColorMode::Grayscale), "Grayscale8");
    }

    #[test]
    fn resolve_absolute_location() {
        let resolved = resolve_location(
            "https://192.168.1.100:443",
            "https://192.168.1.100:443/eSCL/ScanJobs/1a2b/",
        );
        assert_eq!(resolved, "https://192.168.1.100:443/eSCL/ScanJobs/1a2b");
    }

    #[test]
    fn resolve_relative_location() {
        let resolved = resolve_location("https://192.168.1.100:443", "/eSCL/ScanJobs/1a2b");
        assert_eq!(resolved, "https://192.168.1.100:443/eSCL/ScanJobs/1a2b");
    }

    #[test]
    fn client_exposes_config() {
        let client = EsclClient::new(EsclConfig::default().with_port(8080));
        assert_eq!(client.config().port, 8080);
    }
}
