//! Service manager control surface.
//!
//! The orchestrator talks to systemd only through [`ServiceControl`];
//! [`Systemctl`] implements it by shelling out via an [`Executor`].
use crate::config::Settings;
use crate::error::ProcessError;
use crate::exec::{Executor, command_line};
use crate::model::AppName;

/// Tree glyphs `systemctl list-dependencies` may print before a unit name.
const TREE_GLYPHS: &[char] = &['│', '├', '└', '─', '●', '○', '*', '|', '`', '-'];

/// Operations the orchestrator needs from the service manager.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceControl {
    /// Dry-run the quadlet generator over the deployed units.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::UnitValidation`] carrying the generator's
    /// output on a non-zero exit, or any execution error.
    fn validate_units(&self) -> Result<(), ProcessError>;

    /// Make the service manager regenerate units from quadlet files.
    ///
    /// # Errors
    ///
    /// Returns the execution or exit error.
    fn daemon_reload(&self) -> Result<(), ProcessError>;

    /// Whether `service` is currently active.
    ///
    /// # Errors
    ///
    /// Returns an error only if the query could not run; a non-zero exit
    /// means inactive.
    fn is_active(&self, service: &str) -> Result<bool, ProcessError>;

    /// Start `service`.
    ///
    /// # Errors
    ///
    /// Returns the execution or exit error.
    fn start(&self, service: &str) -> Result<(), ProcessError>;

    /// Restart every service in `services` with a single command.
    ///
    /// # Errors
    ///
    /// Returns the execution or exit error.
    fn restart(&self, services: &[String]) -> Result<(), ProcessError>;

    /// Services the main service depends on that belong to `app`.
    ///
    /// Best effort: a failed or timed-out query yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::NotFound`] if the service manager is missing.
    fn app_dependencies(&self, app: &AppName) -> Result<Vec<String>, ProcessError>;
}

/// [`ServiceControl`] backed by the `systemctl` CLI.
#[derive(Debug, Clone, Copy)]
pub struct Systemctl<'a> {
    executor: &'a dyn Executor,
    settings: &'a Settings,
}

impl<'a> Systemctl<'a> {
    /// Create a controller using `settings` for programs and timeouts.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, settings: &'a Settings) -> Self {
        Self { executor, settings }
    }

    fn lifecycle(&self, args: &[&str]) -> Result<(), ProcessError> {
        self.executor
            .run(&self.settings.systemctl, args, self.settings.lifecycle_timeout())
            .map(|_| ())
    }
}

impl ServiceControl for Systemctl<'_> {
    fn validate_units(&self) -> Result<(), ProcessError> {
        let generator = self.settings.generator.to_string_lossy();
        let args = ["-dryrun", "-v"];
        let result =
            self.executor
                .run_unchecked(&generator, &args, self.settings.dry_run_timeout())?;
        if result.success {
            return Ok(());
        }
        Err(ProcessError::UnitValidation {
            command: command_line(&generator, &args),
            code: result.code,
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }

    fn daemon_reload(&self) -> Result<(), ProcessError> {
        self.lifecycle(&["daemon-reload"])
    }

    fn is_active(&self, service: &str) -> Result<bool, ProcessError> {
        let result = self.executor.run_unchecked(
            &self.settings.systemctl,
            &["is-active", service],
            self.settings.query_timeout(),
        )?;
        Ok(result.success && result.stdout.trim() == "active")
    }

    fn start(&self, service: &str) -> Result<(), ProcessError> {
        self.lifecycle(&["start", service])
    }

    fn restart(&self, services: &[String]) -> Result<(), ProcessError> {
        let mut args = vec!["restart"];
        args.extend(services.iter().map(String::as_str));
        self.lifecycle(&args)
    }

    fn app_dependencies(&self, app: &AppName) -> Result<Vec<String>, ProcessError> {
        let main = app.main_service();
        let result = match self.executor.run_unchecked(
            &self.settings.systemctl,
            &["list-dependencies", "--type", "service", &main],
            self.settings.query_timeout(),
        ) {
            Ok(result) => result,
            Err(ProcessError::Timeout { .. }) => {
                tracing::warn!(service = %main, "dependency listing timed out");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        if !result.success {
            return Ok(Vec::new());
        }
        Ok(parse_dependencies(&result.stdout, app))
    }
}

/// App-owned dependency names from `list-dependencies` output, excluding
/// the main service.
#[must_use]
pub fn parse_dependencies(stdout: &str, app: &AppName) -> Vec<String> {
    let prefix = app.prefix();
    let main = app.main_service();
    stdout
        .lines()
        .map(|line| line.trim_start_matches(|c: char| c.is_whitespace() || TREE_GLYPHS.contains(&c)))
        .map(str::trim_end)
        .filter(|name| name.starts_with(&prefix) && *name != main)
        .map(str::to_string)
        .collect()
}
