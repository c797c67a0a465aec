//! Command: deploy an application.
use anyhow::{Context as _, Result};
use std::io::Write;

use crate::cli::{DeployOpts, GlobalOpts};
use crate::config::Settings;
use crate::discovery::discover;
use crate::error::ProcessError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;
use crate::model::Application;
use crate::orchestrator::Orchestrator;
use crate::plan::build_plan;
use crate::report::{self, DeployOutcome};
use crate::systemd::{ServiceControl, Systemctl};

/// Run the deploy command against the host's `systemctl` and print the
/// outcome to `out`.
///
/// # Errors
///
/// Returns an error if `systemctl` is missing (outside a dry run), or if
/// any stage of the deployment fails.
pub fn run(
    global: &GlobalOpts,
    opts: &DeployOpts,
    log: &Logger,
    out: &mut impl Write,
) -> Result<()> {
    let settings = super::load_settings(global, &opts.paths, opts.systemctl_timeout)?;
    let executor = SystemExecutor;
    if !global.dry_run && !executor.which(&settings.systemctl) {
        return Err(ProcessError::NotFound {
            program: settings.systemctl,
        }
        .into());
    }
    let control = Systemctl::new(&executor, &settings);

    let outcome = execute(opts, &settings, &control, log, global.dry_run)?;
    if global.json {
        report::write_json(out, &outcome)?;
    } else {
        report::write_outcome(out, &outcome)?;
    }
    Ok(())
}

/// Validate, plan and deploy through `control`.
///
/// # Errors
///
/// Returns the first validation, I/O, templating or process error.
pub fn execute(
    opts: &DeployOpts,
    settings: &Settings,
    control: &dyn ServiceControl,
    log: &Logger,
    dry_run: bool,
) -> Result<DeployOutcome> {
    let source = super::resolve_source(&opts.source, log)?;
    let paths = settings.paths();

    log.stage("Planning");
    let tree = discover(&source.path)?;
    let renderer = super::renderer_for(&source.name, &opts.vars)?;
    let plan = build_plan(&source.name, &source.path, &tree, &renderer, &paths)?;
    log.info(&format!(
        "{} units, {} files",
        plan.quadlet_files().len(),
        plan.len()
    ));

    let app = Application {
        name: source.name,
        source_tree: source.path,
        desired_state: opts.state,
        force: opts.force,
        timeout: settings.lifecycle_timeout(),
    };
    let outcome = Orchestrator::new(control, log, dry_run)
        .deploy(&app, &plan)
        .with_context(|| format!("deploying {}", app.name))?;
    Ok(outcome)
}
