//! Host settings and template variables.
//!
//! Settings are read from `--config PATH` when given, otherwise from
//! [`DEFAULT_CONFIG_PATH`] when it exists, otherwise built-in defaults.
//! Command-line flags are applied on top with [`Settings::apply`].
pub mod toml_loader;
pub mod vars;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::DeployPaths;

/// System-wide settings file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/quadlet-app/config.toml";

/// Host layout, tool locations and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory the quadlet generator reads units from.
    pub unit_dir: PathBuf,
    /// Parent of every per-application data directory.
    pub app_base: PathBuf,
    /// Service manager control executable.
    pub systemctl: String,
    /// Quadlet generator used for the dry-run check.
    pub generator: PathBuf,
    /// Seconds allowed for `daemon-reload`, `start` and `restart`.
    pub systemctl_timeout: u64,
    /// Seconds allowed for `is-active` and `list-dependencies`.
    pub status_timeout: u64,
    /// Seconds allowed for the generator dry-run.
    pub generator_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("/etc/containers/systemd"),
            app_base: PathBuf::from("/srv"),
            systemctl: "systemctl".to_string(),
            generator: PathBuf::from("/usr/lib/systemd/system-generators/podman-system-generator"),
            systemctl_timeout: 120,
            status_timeout: 10,
            generator_timeout: 30,
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--unit-dir`
    pub unit_dir: Option<PathBuf>,
    /// `--app-base`
    pub app_base: Option<PathBuf>,
    /// `--systemctl-timeout`
    pub systemctl_timeout: Option<u64>,
}

impl Settings {
    /// Load settings from `explicit`, or the default location if present.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is missing or either file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(explicit, Path::new(DEFAULT_CONFIG_PATH))
    }

    /// [`Settings::load`] with a configurable fallback location.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is missing or either file fails to parse.
    pub fn load_from(explicit: Option<&Path>, fallback: &Path) -> Result<Self> {
        let settings = match explicit {
            Some(path) => toml_loader::load_config(path)?,
            None => toml_loader::load_config_or_default(fallback)?,
        };
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(dir) = &overrides.unit_dir {
            self.unit_dir.clone_from(dir);
        }
        if let Some(base) = &overrides.app_base {
            self.app_base.clone_from(base);
        }
        if let Some(secs) = overrides.systemctl_timeout {
            self.systemctl_timeout = secs;
        }
        self
    }

    /// Deployment roots.
    #[must_use]
    pub fn paths(&self) -> DeployPaths {
        DeployPaths {
            unit_dir: self.unit_dir.clone(),
            app_base: self.app_base.clone(),
        }
    }

    /// Timeout for lifecycle commands.
    #[must_use]
    pub const fn lifecycle_timeout(&self) -> Duration {
        Duration::from_secs(self.systemctl_timeout)
    }

    /// Timeout for status queries.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout)
    }

    /// Timeout for the generator dry-run.
    #[must_use]
    pub const fn dry_run_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_layout() {
        let s = Settings::default();
        assert_eq!(s.unit_dir, PathBuf::from("/etc/containers/systemd"));
        assert_eq!(s.app_base, PathBuf::from("/srv"));
        assert_eq!(s.lifecycle_timeout(), Duration::from_secs(120));
        assert_eq!(s.query_timeout(), Duration::from_secs(10));
        assert_eq!(s.dry_run_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_fallback_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(None, &dir.path().join("absent.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from(Some(&dir.path().join("absent.toml")), Path::new("/x")).is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "app_base = \"/var/lib/apps\"\nstatus_timeout = 3\n").unwrap();
        let s = Settings::load_from(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(s.app_base, PathBuf::from("/var/lib/apps"));
        assert_eq!(s.query_timeout(), Duration::from_secs(3));
        assert_eq!(s.systemctl, "systemctl");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "unit_directory = \"/tmp\"\n").unwrap();
        assert!(Settings::load_from(Some(&path), Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn overrides_win() {
        let s = Settings::default().apply(&Overrides {
            unit_dir: Some(PathBuf::from("/tmp/units")),
            app_base: None,
            systemctl_timeout: Some(5),
        });
        assert_eq!(s.unit_dir, PathBuf::from("/tmp/units"));
        assert_eq!(s.app_base, PathBuf::from("/srv"));
        assert_eq!(s.lifecycle_timeout(), Duration::from_secs(5));
        assert_eq!(s.paths().unit_dir, PathBuf::from("/tmp/units"));
    }
}
