//! Domain-specific error types for the quadlet deployment engine.
//!
//! Internal modules return typed errors while command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DeployError
//! ├── Validation(ValidationError)  naming and source-tree shape
//! ├── Io { action, path, source }  reading sources, writing deployments
//! ├── Process(ProcessError)        systemctl and the quadlet generator
//! └── Template(TemplateError)      decoding and Jinja rendering
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for a deployment run.
///
/// Every variant is terminal: nothing is retried and nothing is rolled back.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Structural or naming violation in the application source tree.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Filesystem failure on a specific path.
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        /// What was being attempted (e.g. `"read"`, `"write"`).
        action: &'static str,
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An external command could not run or exited unsuccessfully.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A source file could not be decoded or rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl DeployError {
    /// Build an [`DeployError::Io`] for `path`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the structural validator.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The source tree does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source path exists but is not a directory.
    #[error("Source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    /// The mandatory `quadlets/` subdirectory is absent.
    #[error("Required directory not found: {}. The quadlets/ subdirectory is mandatory.", .0.display())]
    MissingQuadletsDir(PathBuf),

    /// The application name does not match the naming grammar.
    #[error(
        "Invalid application name: {0}. Must start with a letter (a-z), end with a letter or number, \
         and contain only lowercase letters, numbers, hyphens, and underscores."
    )]
    InvalidName(String),

    /// `quadlets/main.container` is absent or not a regular file.
    #[error("Required file not found: {}. The quadlets/main.container file is mandatory.", .0.display())]
    MissingMainContainer(PathBuf),

    /// An auxiliary subdirectory carries a `.container`/`.pod` suffix.
    #[error("Invalid {dir} subdirectory: {entry}. Use the quadlet stem without suffix (e.g., {stem}/ instead of {entry}/)")]
    SuffixedAuxDir {
        /// Auxiliary root (`init.d` or `config.d`).
        dir: &'static str,
        /// Offending subdirectory name.
        entry: String,
        /// The name the subdirectory should have.
        stem: String,
    },

    /// No `.container`/`.pod` unit matches an auxiliary subdirectory.
    #[error("No corresponding quadlet file for {dir}/{entry}. Expected a file like quadlets/{entry}.container or quadlets/{entry}.pod")]
    OrphanedAuxDir {
        /// Auxiliary root (`init.d` or `config.d`).
        dir: &'static str,
        /// Offending subdirectory name.
        entry: String,
    },

    /// More than one unit matches an auxiliary subdirectory.
    #[error("Ambiguous {dir} subdirectory: {entry}. Multiple matching quadlet files found: {}. Remove one of the conflicting quadlet files", .matches.join(", "))]
    AmbiguousAuxDir {
        /// Auxiliary root (`init.d` or `config.d`).
        dir: &'static str,
        /// Offending subdirectory name.
        entry: String,
        /// Every matching quadlet filename, sorted.
        matches: Vec<String>,
    },

    /// A directory of the source tree could not be listed.
    #[error("Cannot read {}: {source}", .path.display())]
    UnreadableDir {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised while running external commands.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The executable is not installed. Always fatal.
    #[error("{program} command not found")]
    NotFound {
        /// Program that could not be located.
        program: String,
    },

    /// The process could not be spawned for a reason other than absence.
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Full command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting for the process failed.
    #[error("failed to wait for {command}: {source}")]
    Wait {
        /// Full command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The process outlived its deadline and was killed.
    #[error("{command} timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Full command line.
        command: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The process exited non-zero.
    #[error("{command} failed (exit {}): {}", .code.unwrap_or(-1), .stderr.trim())]
    Failed {
        /// Full command line.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The quadlet generator rejected the deployed units.
    #[error("{}", .stderr.trim())]
    UnitValidation {
        /// Full command line.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error (the generator's diagnostics).
        stderr: String,
    },
}

/// Errors raised while decoding or rendering source files.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The file is not valid UTF-8.
    #[error("File {} is not valid UTF-8: {source}", .path.display())]
    NotUtf8 {
        /// Offending source file.
        path: PathBuf,
        /// Decoding error.
        source: std::string::FromUtf8Error,
    },

    /// The file failed to parse or render, including use of an undefined
    /// variable.
    #[error("Failed to template file {}: {source}", .path.display())]
    Render {
        /// Offending source file.
        path: PathBuf,
        /// Template engine error.
        source: minijinja::Error,
    },
}
