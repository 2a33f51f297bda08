//! [`Prober`] that shells out to `nmap`.

use super::{ProbeError, ProbeHost, ProbeOptions, Prober, SourceFuture};
use crate::parser::nmap_xml::parse_report;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs `nmap -oX -` and reads the XML report from stdout.
#[derive(Debug, Clone)]
pub struct NmapProber {
    program: String,
}

impl Default for NmapProber {
    fn default() -> Self {
        Self {
            program: "nmap".to_string(),
        }
    }
}

impl NmapProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different nmap binary, e.g. an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn probe(
        &self,
        hosts: &[String],
        options: &ProbeOptions,
        timeout: Duration,
    ) -> Result<Vec<ProbeHost>, ProbeError> {
        let args = build_args(hosts, options);
        debug!("Running {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(&args).kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|e| ProbeError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_report(&stdout).map_err(|e| ProbeError::Output(e.to_string()))
    }
}

/// Build the nmap command line for a sweep.
pub fn build_args(hosts: &[String], options: &ProbeOptions) -> Vec<String> {
    let mut args = vec!["-oX".to_string(), "-".to_string()];
    if options.fast {
        args.push("-F".to_string());
    }
    args.push("--host-timeout".to_string());
    args.push(format!("{}ms", options.host_timeout.as_millis()));
    if !options.exclude.is_empty() {
        args.push("--exclude".to_string());
        args.push(options.exclude.join(","));
    }
    args.extend(hosts.iter().cloned());
    args
}

impl Prober for NmapProber {
    fn run_probe<'a>(
        &'a self,
        hosts: &'a [String],
        options: &'a ProbeOptions,
        timeout: Duration,
    ) -> SourceFuture<'a, Result<Vec<ProbeHost>, ProbeError>> {
        Box::pin(self.probe(hosts, options, timeout))
    }
}
