//! Drive a deployment plan to the desired service state.
//!
//! What happens is decided up front by [`Actions::decide`] from three
//! inputs: the desired state, whether any planned file differs from disk,
//! and (for `started` only) whether the main service is active. The
//! [`Orchestrator`] then carries the actions out in a fixed order:
//!
//! 1. write changed files
//! 2. dry-run the quadlet generator over the unit directory
//! 3. `daemon-reload`
//! 4. `start`, or `restart` of the app's dependencies followed by the main
//!    service
//!
//! Any failure stops the run where it is. Files already written stay
//! written; the next run's checksum comparison picks up from there.
use std::fmt;
use std::path::PathBuf;

use crate::error::DeployError;
use crate::idempotency;
use crate::logging::Logger;
use crate::model::{Application, DeploymentPlan, DesiredState};
use crate::report::DeployOutcome;
use crate::resources::{DeployedFile, Resource};
use crate::systemd::ServiceControl;

/// Message reported when nothing had to be done.
pub const UP_TO_DATE_MSG: &str = "application already up to date";

/// Lifecycle command issued after files are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Leave the service alone.
    None,
    /// `systemctl start <main>`.
    Start,
    /// Restart app-owned dependencies, then the main service.
    Restart,
}

/// Everything one run will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actions {
    /// Write files, validate units and reload the service manager.
    pub deploy_files: bool,
    /// What to do with the main service afterwards.
    pub lifecycle: Lifecycle,
}

impl Actions {
    /// Map a desired state and the observed host state to actions.
    ///
    /// `service_active` is ignored for every state except
    /// [`DesiredState::Started`].
    ///
    /// # Examples
    ///
    /// ```
    /// use quadlet_app::model::DesiredState;
    /// use quadlet_app::orchestrator::{Actions, Lifecycle};
    ///
    /// let a = Actions::decide(DesiredState::Started, false, false);
    /// assert!(!a.deploy_files);
    /// assert_eq!(a.lifecycle, Lifecycle::Start);
    /// assert!(Actions::decide(DesiredState::Installed, false, true).is_noop());
    /// ```
    #[must_use]
    pub const fn decide(state: DesiredState, files_changed: bool, service_active: bool) -> Self {
        let lifecycle = match state {
            DesiredState::Installed => Lifecycle::None,
            DesiredState::Started => match (files_changed, service_active) {
                (true, true) => Lifecycle::Restart,
                (_, false) => Lifecycle::Start,
                (false, true) => Lifecycle::None,
            },
            DesiredState::Restarted => Lifecycle::Restart,
        };
        Self {
            deploy_files: files_changed,
            lifecycle,
        }
    }

    /// Whether the run touches neither files nor services.
    #[must_use]
    pub const fn is_noop(self) -> bool {
        !self.deploy_files && matches!(self.lifecycle, Lifecycle::None)
    }
}

/// Success message for a run that changed something.
#[must_use]
pub const fn success_message(state: DesiredState) -> &'static str {
    match state {
        DesiredState::Installed => "quadlet files deployed",
        DesiredState::Started => "quadlet files deployed and service started",
        DesiredState::Restarted => "quadlet files deployed and service restarted",
    }
}

/// Applies a [`DeploymentPlan`] through a [`ServiceControl`].
pub struct Orchestrator<'a> {
    control: &'a dyn ServiceControl,
    log: &'a Logger,
    dry_run: bool,
}

impl fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator. With `dry_run`, nothing is written and no
    /// lifecycle command runs; the outcome reports what would change.
    #[must_use]
    pub const fn new(control: &'a dyn ServiceControl, log: &'a Logger, dry_run: bool) -> Self {
        Self {
            control,
            log,
            dry_run,
        }
    }

    /// Deploy `plan` for `app`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Io`] if a file cannot be written, or
    /// [`DeployError::Process`] if the generator rejects the units or a
    /// service-manager command fails or times out.
    pub fn deploy(
        &self,
        app: &Application,
        plan: &DeploymentPlan,
    ) -> Result<DeployOutcome, DeployError> {
        let service = app.name.main_service();
        self.log.stage(&format!("Deploying {}", app.name));
        self.log.debug(&format!(
            "state {}, {} planned files, lifecycle timeout {}s",
            app.desired_state,
            plan.len(),
            app.timeout.as_secs()
        ));

        let changed = idempotency::changed_files(plan, app.force);
        let files_changed = app.force || !changed.is_empty();
        for path in &changed {
            self.log.debug(&format!("changed: {}", path.display()));
        }

        let service_active = if app.desired_state == DesiredState::Started {
            self.service_active(&service)?
        } else {
            false
        };

        let actions = Actions::decide(app.desired_state, files_changed, service_active);
        self.log.debug(&format!("{actions:?}"));

        let mut outcome = DeployOutcome {
            changed: false,
            application_name: app.name.to_string(),
            service_name: service.clone(),
            quadlet_files: plan.quadlet_files().to_vec(),
            msg: UP_TO_DATE_MSG.to_string(),
        };
        if actions.is_noop() {
            self.log.info(UP_TO_DATE_MSG);
            return Ok(outcome);
        }

        if actions.deploy_files {
            self.write_files(plan, &changed)?;
            self.reload()?;
        }

        match actions.lifecycle {
            Lifecycle::None => {}
            Lifecycle::Start => self.start(&service)?,
            Lifecycle::Restart => self.restart(app, &service)?,
        }

        outcome.changed = true;
        outcome.msg = success_message(app.desired_state).to_string();
        self.log.info(&outcome.msg);
        Ok(outcome)
    }

    fn service_active(&self, service: &str) -> Result<bool, DeployError> {
        match self.control.is_active(service) {
            Ok(active) => {
                self.log
                    .debug(&format!("{service} is {}", if active { "active" } else { "inactive" }));
                Ok(active)
            }
            Err(e) if self.dry_run => {
                self.log
                    .warn(&format!("cannot query {service}, assuming inactive: {e}"));
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_files(&self, plan: &DeploymentPlan, changed: &[PathBuf]) -> Result<(), DeployError> {
        self.log.stage("Writing files");
        for path in changed {
            let Some(content) = plan.content(path) else {
                continue;
            };
            let file = DeployedFile::new(path, content);
            if self.dry_run {
                self.log.dry_run(&format!("would write {}", file.description()));
                continue;
            }
            file.apply()?;
            self.log.info(&format!("wrote {}", file.description()));
        }
        Ok(())
    }

    /// Validate generated units, then reload. The reload never runs when
    /// validation fails.
    fn reload(&self) -> Result<(), DeployError> {
        if self.dry_run {
            self.log.dry_run("would validate units with the quadlet generator");
            self.log.dry_run("would run systemctl daemon-reload");
            return Ok(());
        }
        self.log.stage("Reloading service manager");
        self.control.validate_units()?;
        self.log.debug("quadlet generator accepted units");
        self.control.daemon_reload()?;
        self.log.info("daemon-reload complete");
        Ok(())
    }

    fn start(&self, service: &str) -> Result<(), DeployError> {
        if self.dry_run {
            self.log.dry_run(&format!("would start {service}"));
            return Ok(());
        }
        self.log.stage(&format!("Starting {service}"));
        self.control.start(service)?;
        Ok(())
    }

    fn restart(&self, app: &Application, service: &str) -> Result<(), DeployError> {
        if self.dry_run {
            self.log
                .dry_run(&format!("would restart dependencies of {service}, then {service}"));
            return Ok(());
        }
        self.log.stage(&format!("Restarting {}", app.name));
        let deps = self.control.app_dependencies(&app.name)?;
        if deps.is_empty() {
            self.log.debug("no app-owned dependencies");
        } else {
            self.log.info(&format!("restarting {}", deps.join(", ")));
            self.control.restart(&deps)?;
        }
        self.control.restart(&[service.to_string()])?;
        self.log.info(&format!("restarted {service}"));
        Ok(())
    }
}
