// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed application source tree with
// deployment roots next to it, and a service manager stand-in that records
// every call so tests can assert on exact command order.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use quadlet_app::cli::{DeployOpts, PathOpts, SourceOpts, VarOpts};
use quadlet_app::config::Settings;
use quadlet_app::error::ProcessError;
use quadlet_app::model::{AppName, DesiredState};
use quadlet_app::systemd::ServiceControl;

/// Minimal valid `main.container`.
pub const MAIN_CONTAINER: &str = "[Container]\nImage=docker.io/library/nginx:1.27\nNetwork=main.network\n";

/// An application source tree plus unit and data directories, all inside
/// one [`tempfile::TempDir`].
///
/// Layout:
/// - `src/<app>/quadlets/main.container`
/// - `units/` (unit directory)
/// - `srv/` (application base directory)
#[derive(Debug)]
pub struct Fixture {
    /// Temporary root, deleted on drop.
    pub root: tempfile::TempDir,
    app: String,
}

impl Fixture {
    /// Create a fixture for `app` with only `quadlets/main.container`.
    pub fn new(app: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let fixture = Self {
            root,
            app: app.to_string(),
        };
        fixture.write("quadlets/main.container", MAIN_CONTAINER);
        fixture
    }

    /// Write `content` to `rel` inside the source tree.
    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.src().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create source dir");
        std::fs::write(path, content).expect("write source file");
        self
    }

    /// Application source tree.
    pub fn src(&self) -> PathBuf {
        self.root.path().join("src").join(&self.app)
    }

    /// Unit directory.
    pub fn unit_dir(&self) -> PathBuf {
        self.root.path().join("units")
    }

    /// Application base directory.
    pub fn app_base(&self) -> PathBuf {
        self.root.path().join("srv")
    }

    /// Path of a deployed unit, `<unit-dir>/<app>--<filename>`.
    pub fn unit(&self, filename: &str) -> PathBuf {
        self.unit_dir().join(format!("{}--{filename}", self.app))
    }

    /// Settings pointing both deployment roots into the fixture.
    pub fn settings(&self) -> Settings {
        Settings {
            unit_dir: self.unit_dir(),
            app_base: self.app_base(),
            ..Settings::default()
        }
    }

    /// Deploy options for this source tree.
    pub fn deploy_opts(&self, state: DesiredState, force: bool) -> DeployOpts {
        DeployOpts {
            source: SourceOpts {
                src: self.src(),
                name: None,
            },
            state,
            force,
            systemctl_timeout: None,
            paths: PathOpts::default(),
            vars: VarOpts::default(),
        }
    }
}

/// Read a deployed file, panicking with its path when absent.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// [`ServiceControl`] that records each call as a command-like string.
#[derive(Debug, Default)]
pub struct RecordingControl {
    pub calls: RefCell<Vec<String>>,
    /// Answer for every `is-active` query.
    pub active: bool,
    /// Answer for every dependency listing.
    pub dependencies: Vec<String>,
    /// When set, the generator dry-run fails with this stderr.
    pub generator_stderr: Option<String>,
}

impl RecordingControl {
    /// A control whose main service reports `active`.
    pub fn with_active(active: bool) -> Self {
        Self {
            active,
            ..Self::default()
        }
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ServiceControl for RecordingControl {
    fn validate_units(&self) -> Result<(), ProcessError> {
        self.record("generator -dryrun".to_string());
        match &self.generator_stderr {
            Some(stderr) => Err(ProcessError::UnitValidation {
                command: "podman-system-generator -dryrun -v".to_string(),
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    fn daemon_reload(&self) -> Result<(), ProcessError> {
        self.record("daemon-reload".to_string());
        Ok(())
    }

    fn is_active(&self, service: &str) -> Result<bool, ProcessError> {
        self.record(format!("is-active {service}"));
        Ok(self.active)
    }

    fn start(&self, service: &str) -> Result<(), ProcessError> {
        self.record(format!("start {service}"));
        Ok(())
    }

    fn restart(&self, services: &[String]) -> Result<(), ProcessError> {
        self.record(format!("restart {}", services.join(" ")));
        Ok(())
    }

    fn app_dependencies(&self, app: &AppName) -> Result<Vec<String>, ProcessError> {
        self.record(format!("list-dependencies {}", app.main_service()));
        Ok(self.dependencies.clone())
    }
}
