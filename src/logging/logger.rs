//! Logging facade used by command handlers and the orchestrator.
use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};

/// Thin facade over [`tracing`] that routes stage headers and dry-run
/// notices to their dedicated targets.
///
/// Where events end up (console, `--log-file`) is decided by the subscriber
/// installed with [`init_subscriber`](super::init_subscriber).
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log an action that a dry run skipped.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }
}
