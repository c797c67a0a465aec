//! Run results as printed to the caller.
use std::io::{self, Write};

use serde::Serialize;

use crate::error::{DeployError, ProcessError};

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    /// Whether anything on the host changed (or would change, in a dry run).
    pub changed: bool,
    /// Normalized application name.
    pub application_name: String,
    /// Name of the main systemd service.
    pub service_name: String,
    /// Deployed unit filenames (`<app>--<filename>`).
    pub quadlet_files: Vec<String>,
    /// Human-readable summary.
    pub msg: String,
}

/// Result of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Always `true`.
    pub failed: bool,
    /// Error message including context.
    pub msg: String,
    /// Failing command line, for process errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Exit code of the failing command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
    /// Captured standard output of the failing command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured standard error of the failing command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl FailureReport {
    /// Build a report from any error, extracting process details when the
    /// chain contains a [`ProcessError`].
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        let mut report = Self {
            failed: true,
            msg: format!("{err:#}"),
            cmd: None,
            rc: None,
            stdout: None,
            stderr: None,
        };
        if let Some(process) = find_process_error(err) {
            report.fill_process(process);
        }
        report
    }

    fn fill_process(&mut self, err: &ProcessError) {
        match err {
            ProcessError::Failed {
                command,
                code,
                stdout,
                stderr,
            }
            | ProcessError::UnitValidation {
                command,
                code,
                stdout,
                stderr,
            } => {
                self.cmd = Some(command.clone());
                self.rc = *code;
                self.stdout = Some(stdout.clone());
                self.stderr = Some(stderr.clone());
            }
            ProcessError::Timeout { command, .. }
            | ProcessError::Spawn { command, .. }
            | ProcessError::Wait { command, .. } => self.cmd = Some(command.clone()),
            ProcessError::NotFound { program } => self.cmd = Some(program.clone()),
        }
    }
}

fn find_process_error(err: &anyhow::Error) -> Option<&ProcessError> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<ProcessError>().or_else(|| {
            match cause.downcast_ref::<DeployError>() {
                Some(DeployError::Process(p)) => Some(p),
                _ => None,
            }
        })
    })
}

/// Write `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Write the human-readable form of a successful deployment.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_outcome(out: &mut impl Write, outcome: &DeployOutcome) -> io::Result<()> {
    let status = if outcome.changed { "changed" } else { "ok" };
    writeln!(
        out,
        "{status}: {} ({}): {}",
        outcome.application_name, outcome.service_name, outcome.msg
    )?;
    for file in &outcome.quadlet_files {
        writeln!(out, "  {file}")?;
    }
    Ok(())
}

/// Write the process details of a failure: command line, exit code and
/// captured output. The message itself goes through
/// [`Logger::error`](crate::logging::Logger::error).
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_failure(out: &mut impl Write, report: &FailureReport) -> io::Result<()> {
    if let Some(cmd) = &report.cmd {
        writeln!(out, "  command: {cmd}")?;
    }
    if let Some(rc) = report.rc {
        writeln!(out, "  exit code: {rc}")?;
    }
    for (label, text) in [("stdout", &report.stdout), ("stderr", &report.stderr)] {
        if let Some(text) = text
            && !text.trim().is_empty()
        {
            writeln!(out, "  {label}:")?;
            for line in text.lines() {
                writeln!(out, "    {line}")?;
            }
        }
    }
    Ok(())
}
