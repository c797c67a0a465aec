//! Subcommand handlers and the setup they share.
pub mod completions;
pub mod deploy;
pub mod render;
pub mod validate;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, PathOpts, SourceOpts, VarOpts};
use crate::config::{Overrides, Settings, vars};
use crate::logging::Logger;
use crate::model::AppName;
use crate::template::{APP_NAME_VAR, VarRenderer};

/// A validated source tree and the application name derived from it.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Source tree, canonicalized when it exists.
    pub path: PathBuf,
    /// Normalized application name.
    pub name: AppName,
}

/// Resolve the source tree, derive the name when not given, and run the
/// structural validator.
///
/// # Errors
///
/// Returns the validator's error if the tree or name is invalid.
pub fn resolve_source(source: &SourceOpts, log: &Logger) -> Result<ResolvedSource> {
    let path = dunce::canonicalize(&source.src).unwrap_or_else(|_| source.src.clone());
    let raw_name = source
        .name
        .clone()
        .unwrap_or_else(|| default_name(&path));
    log.debug(&format!("source {} as '{raw_name}'", path.display()));

    log.stage("Validating source tree");
    let name = crate::validate::validate(&path, &raw_name)?;
    log.info(&format!("application: {name}"));
    Ok(ResolvedSource { path, name })
}

/// Basename of `path`, used when no explicit name is given.
#[must_use]
pub fn default_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load settings and apply command-line overrides.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or parsed.
pub fn load_settings(
    global: &GlobalOpts,
    paths: &PathOpts,
    systemctl_timeout: Option<u64>,
) -> Result<Settings> {
    let settings = Settings::load(global.config.as_deref())?;
    Ok(settings.apply(&Overrides {
        unit_dir: paths.unit_dir.clone(),
        app_base: paths.app_base.clone(),
        systemctl_timeout,
    }))
}

/// Build the renderer for `app` from `--vars-file` and `--var`.
///
/// [`APP_NAME_VAR`] always holds the normalized name, whatever the
/// variable sources say.
///
/// # Errors
///
/// Returns an error if the variables file cannot be loaded.
pub fn renderer_for(app: &AppName, opts: &VarOpts) -> Result<VarRenderer> {
    let collected = vars::collect(opts.vars_file.as_deref(), &opts.vars)
        .context("loading template variables")?;
    let mut renderer = VarRenderer::new(app.as_str());
    renderer.extend(collected);
    renderer.insert(APP_NAME_VAR, app.as_str());
    Ok(renderer)
}
