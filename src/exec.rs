//! External command execution with deadlines.
//!
//! Every call to `systemctl` and the quadlet generator goes through an
//! [`Executor`], so the service-manager adapter can be exercised without a
//! real init system.
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ProcessError;

/// Interval between exit-status polls while waiting on a child.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Convert an unsuccessful result into [`ProcessError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Failed`] when `success` is false.
    pub fn check(self, command: &str) -> Result<Self, ProcessError> {
        if self.success {
            Ok(self)
        } else {
            Err(ProcessError::Failed {
                command: command.to_string(),
                code: self.code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Render `program` and `args` as a single space-joined command line.
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Abstraction over process execution.
pub trait Executor: std::fmt::Debug {
    /// Run a command to completion or until `timeout` elapses, without
    /// treating a non-zero exit as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::NotFound`] if the program is not installed,
    /// [`ProcessError::Timeout`] if it was killed at the deadline, or
    /// [`ProcessError::Spawn`]/[`ProcessError::Wait`] on other I/O failures.
    fn run_unchecked(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ExecResult, ProcessError>;

    /// Run a command and fail if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Everything [`Executor::run_unchecked`] returns, plus
    /// [`ProcessError::Failed`] on a non-zero exit.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ExecResult, ProcessError> {
        self.run_unchecked(program, args, timeout)?
            .check(&command_line(program, args))
    }

    /// Whether `program` resolves to an executable.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ExecResult, ProcessError> {
        let command = command_line(program, args);
        tracing::debug!(%command, timeout_secs = timeout.as_secs(), "exec");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotFound {
                        program: program.to_string(),
                    }
                } else {
                    ProcessError::Spawn {
                        command: command.clone(),
                        source,
                    }
                }
            })?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we poll for its exit.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::debug!(%command, "killed after timeout");
                return Err(ProcessError::Timeout { command, timeout });
            }
            Err(source) => {
                let _ = child.kill();
                return Err(ProcessError::Wait { command, source });
            }
        };

        let result = ExecResult {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            success: status.success(),
            code: status.code(),
        };
        tracing::debug!(%command, code = ?result.code, "exited");
        Ok(result)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Poll `child` until it exits or `timeout` elapses (`Ok(None)`).
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a pipe to completion on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
