//! CUPS command-line spooler backend.

use std::path::Path;
use std::process::Output;
use std::sync::Arc;

use scandock_core::print::{PrintJob, PrintProvider};
use scandock_core::{Error, Result, ServiceHealth};
use tokio::process::Command;

use super::{CupsConfig, TRACING_TARGET};

/// Print spooler backend over the CUPS command-line tools.
///
/// Queue discovery parses `lpstat -a`; submission runs `lp -d` and extracts
/// the job identifier from the spooler's acknowledgement line.
#[derive(Clone, Debug)]
pub struct CupsSpooler {
    config: Arc<CupsConfig>,
}

impl CupsSpooler {
    /// Creates a new spooler backend with the given configuration.
    pub fn new(config: CupsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Gets the spooler configuration.
    pub fn config(&self) -> &CupsConfig {
        &self.config
    }

    /// Runs one spooler command under the configured timeout.
    async fn run(&self, binary: &str, args: &[&std::ffi::OsStr]) -> Result<Output> {
        let run = tokio::time::timeout(
            self.config.effective_timeout(),
            Command::new(binary).args(args).kill_on_drop(true).output(),
        )
        .await;

        match run {
            Err(_elapsed) => Err(Error::queue_unreachable()
                .with_message(format!("{binary} did not respond in time"))),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::queue_unreachable()
                .with_message(format!("{binary} not found in PATH"))
                .with_source(e)),
            Ok(Err(e)) => Err(Error::queue_unreachable()
                .with_message(format!("failed to spawn {binary}"))
                .with_source(e)),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

impl Default for CupsSpooler {
    fn default() -> Self {
        Self::new(CupsConfig::default())
    }
}

#[async_trait::async_trait]
impl PrintProvider for CupsSpooler {
    async fn queues(&self) -> Result<Vec<String>> {
        let output = self
            .run(&self.config.lpstat_binary, &["-a".as_ref()])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No destinations") {
                return Ok(Vec::new());
            }
            return Err(Error::queue_unreachable()
                .with_message(format!("lpstat exited with {}", output.status)));
        }

        let queues = parse_queues(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(
            target: TRACING_TARGET,
            count = queues.len(),
            "Listed print queues"
        );
        Ok(queues)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(queue = %queue))]
    async fn submit(&self, path: &Path, queue: &str) -> Result<PrintJob> {
        let output = self
            .run(
                &self.config.lp_binary,
                &["-d".as_ref(), queue.as_ref(), path.as_os_str()],
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(200).collect();
            return Err(Error::print_rejected()
                .with_message(format!("lp exited with {}: {excerpt}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = parse_job_id(&stdout).unwrap_or_default();
        tracing::info!(
            target: TRACING_TARGET,
            job_id = %id,
            "Print job accepted"
        );

        Ok(PrintJob {
            id,
            queue: queue.to_owned(),
        })
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let probe = self.run(&self.config.lpstat_binary, &["-r".as_ref()]).await;

        match probe {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.contains("is running") {
                    Ok(ServiceHealth::healthy())
                } else {
                    Ok(ServiceHealth::degraded(stdout.trim().to_owned()))
                }
            }
            Ok(output) => Ok(ServiceHealth::degraded(format!(
                "lpstat -r exited with {}",
                output.status
            ))),
            Err(e) => Ok(ServiceHealth::unhealthy(e.to_string())),
        }
    }
}

/// Parses queue names from `lpstat -a` output.
///
/// Each line reads `<queue> accepting requests since <date>`; the queue name
/// is the first whitespace-separated token.
fn parse_queues(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("lpstat:"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_owned)
        .collect()
}

/// Extracts the job identifier from the `lp` acknowledgement.
///
/// The acknowledgement reads `request id is <queue>-<number> (1 file(s))`.
fn parse_job_id(stdout: &str) -> Option<String> {
    let rest = stdout.split("request id is ").nth(1)?;
    rest.split_whitespace().next().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_names() {
        let stdout = "Office_Laser accepting requests since Mon 01 Sep 2025\n\
                      Basement_Inkjet accepting requests since Tue 02 Sep 2025\n";
        assert_eq!(parse_queues(stdout), vec!["Office_Laser", "Basement_Inkjet"]);
    }

    #[test]
    fn queue_parse_skips_noise_lines() {
        let stdout = "lpstat: connection refused\n\n";
        assert!(parse_queues(stdout).is_empty());
    }

    #[test]
    fn parses_job_id_from_acknowledgement() {
        let stdout = "request id is Office_Laser-42 (1 file(s))\n";
        assert_eq!(parse_job_id(stdout).as_deref(), Some("Office_Laser-42"));
    }

    #[test]
    fn job_id_absent_on_malformed_acknowledgement() {
        assert_eq!(parse_job_id("printing started\n"), None);
        assert_eq!(parse_job_id(""), None);
    }
}
