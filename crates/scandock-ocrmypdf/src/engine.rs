//! ocrmypdf subprocess engine.

use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::time::Instant;

use scandock_core::ocr::{OcrOptions, OcrProvider};
use scandock_core::{Error, Result, ServiceHealth};
use tokio::process::Command;

use super::{OcrmypdfConfig, TRACING_TARGET};

/// OCR engine shelling out to `ocrmypdf`.
///
/// Each run is bounded by the configured timeout; the child process is killed
/// when the deadline elapses. All failures surface as
/// [`ErrorKind::OcrFailed`](scandock_core::ErrorKind::OcrFailed) so the
/// pipeline can degrade to storing the unprocessed draft.
#[derive(Clone, Debug)]
pub struct OcrmypdfEngine {
    config: Arc<OcrmypdfConfig>,
}

impl OcrmypdfEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: OcrmypdfConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Gets the engine configuration.
    pub fn config(&self) -> &OcrmypdfConfig {
        &self.config
    }
}

impl Default for OcrmypdfEngine {
    fn default() -> Self {
        Self::new(OcrmypdfConfig::default())
    }
}

#[async_trait::async_trait]
impl OcrProvider for OcrmypdfEngine {
    #[tracing::instrument(level = "debug", skip_all, fields(input = %input.display()))]
    async fn process(&self, input: &Path, output: &Path, options: &OcrOptions) -> Result<()> {
        options.validate()?;

        let mut command = Command::new(&self.config.binary);
        command
            .args(build_args(input, output, options))
            .kill_on_drop(true);

        let timeout = self.config.effective_timeout();
        let started = Instant::now();

        let run = tokio::time::timeout(timeout, command.output()).await;
        let result = match run {
            Err(_elapsed) => Err(Error::ocr_failed().with_message(format!(
                "ocrmypdf exceeded the {}s timeout",
                timeout.as_secs()
            ))),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ocr_failed()
                .with_message(format!("{} not found in PATH", self.config.binary))
                .with_source(e)),
            Ok(Err(e)) => Err(Error::ocr_failed()
                .with_message("failed to spawn ocrmypdf")
                .with_source(e)),
            Ok(Ok(run_output)) => check_run(&run_output),
        };

        match &result {
            Ok(()) => tracing::debug!(
                target: TRACING_TARGET,
                elapsed_ms = started.elapsed().as_millis(),
                output = %output.display(),
                "OCR pass completed"
            ),
            Err(e) => tracing::warn!(
                target: TRACING_TARGET,
                elapsed_ms = started.elapsed().as_millis(),
                error = %e,
                "OCR pass failed"
            ),
        }

        result
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let probe = Command::new(&self.config.binary)
            .arg("--version")
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(std::time::Duration::from_secs(5), probe).await {
            Ok(Ok(output)) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
                Ok(ServiceHealth::healthy()
                    .with_metric("version", serde_json::Value::String(version)))
            }
            Ok(Ok(output)) => Ok(ServiceHealth::degraded(format!(
                "ocrmypdf --version exited with {}",
                output.status
            ))),
            Ok(Err(_)) => Ok(ServiceHealth::unhealthy(format!(
                "{} is not installed",
                self.config.binary
            ))),
            Err(_elapsed) => Ok(ServiceHealth::degraded("ocrmypdf --version timed out")),
        }
    }
}

/// Builds the argument list for one run.
///
/// PDF inputs keep an existing text layer, raster inputs are recognized in
/// full.
fn build_args(input: &Path, output: &Path, options: &OcrOptions) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = vec![
        "--language".into(),
        options.language.clone().into(),
        "--optimize".into(),
        options.optimize.to_string().into(),
    ];

    if options.deskew {
        args.push("--deskew".into());
    }
    if options.clean {
        args.push("--clean".into());
    }

    if is_pdf(input) {
        args.push("--skip-text".into());
    } else {
        args.push("--force-ocr".into());
    }

    args.push(input.as_os_str().to_owned());
    args.push(output.as_os_str().to_owned());
    args
}

/// Maps a finished run to a result, carrying a stderr excerpt on failure.
fn check_run(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let excerpt: String = stderr.trim().chars().take(300).collect();
    Err(Error::ocr_failed().with_message(format!(
        "ocrmypdf exited with {}: {excerpt}",
        output.status
    )))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_strings(input: &str, output: &str, options: &OcrOptions) -> Vec<String> {
        build_args(Path::new(input), Path::new(output), options)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn pdf_input_keeps_existing_text() {
        let args = arg_strings("in.pdf", "out.pdf", &OcrOptions::default());
        assert!(args.contains(&"--skip-text".to_owned()));
        assert!(!args.contains(&"--force-ocr".to_owned()));
    }

    #[test]
    fn image_input_forces_full_recognition() {
        let args = arg_strings("page.jpg", "out.pdf", &OcrOptions::default());
        assert!(args.contains(&"--force-ocr".to_owned()));
        assert!(!args.contains(&"--skip-text".to_owned()));
    }

    #[test]
    fn options_map_to_flags() {
        let options = OcrOptions {
            language: "deu".to_owned(),
            deskew: true,
            clean: false,
            optimize: 2,
        };
        let args = arg_strings("in.pdf", "out.pdf", &options);

        let language_at = args.iter().position(|a| a == "--language");
        assert_eq!(language_at.map(|i| args[i + 1].as_str()), Some("deu"));
        let optimize_at = args.iter().position(|a| a == "--optimize");
        assert_eq!(optimize_at.map(|i| args[i + 1].as_str()), Some("2"));
        assert!(args.contains(&"--deskew".to_owned()));
        assert!(!args.contains(&"--clean".to_owned()));
    }

    #[test]
    fn input_and_output_are_positional_tail() {
        let args = arg_strings("a.pdf", "b.pdf", &OcrOptions::default());
        assert_eq!(args[args.len() - 2], "a.pdf");
        assert_eq!(args[args.len() - 1], "b.pdf");
    }

    #[test]
    fn pdf_extension_detection_ignores_case() {
        assert!(is_pdf(Path::new("SCAN.PDF")));
        assert!(!is_pdf(Path::new("scan.jpeg")));
        assert!(!is_pdf(Path::new("noext")));
    }

    #[test]
    #[cfg(unix)]
    fn failed_run_includes_stderr_excerpt() {
        use std::os::unix::process::ExitStatusExt;

        let output = Output {
            status: std::process::ExitStatus::from_raw(256),
            stdout: Vec::new(),
            stderr: b"PriorOcrFoundError: page already has text".to_vec(),
        };
        let error = check_run(&output).unwrap_err();
        assert!(error.to_string().contains("PriorOcrFoundError"));
    }
}
