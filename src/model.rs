//! Shared data model: application identity, desired state, unit and
//! auxiliary files, and the deployment plan.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Separator between the application name and a resource name.
pub const NAMESPACE_SEPARATOR: &str = "--";

/// Stem of the unit every application must provide.
pub const MAIN_UNIT_STEM: &str = "main";

static SINGLE_CHAR_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z]$").ok());

static MULTI_CHAR_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]*[a-z0-9]$").ok());

/// A validated, lowercase application name.
///
/// # Examples
///
/// ```
/// use quadlet_app::model::AppName;
///
/// let name = AppName::parse("Shop").unwrap();
/// assert_eq!(name.as_str(), "shop");
/// assert_eq!(name.prefixed("main.network"), "shop--main.network");
/// assert_eq!(name.main_service(), "shop--main.service");
/// assert!(AppName::parse("shop-").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    /// Lowercase `raw` and check it against the naming grammar.
    ///
    /// Single-character names must be a single letter; longer names must
    /// start with a letter, end with a letter or digit, and contain only
    /// lowercase letters, digits, `-` and `_`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidName`] if the normalized name does
    /// not match.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let name = raw.to_lowercase();
        let pattern = if name.chars().count() == 1 {
            SINGLE_CHAR_NAME.as_ref()
        } else {
            MULTI_CHAR_NAME.as_ref()
        };
        if pattern.is_some_and(|p| p.is_match(&name)) {
            Ok(Self(name))
        } else {
            Err(ValidationError::InvalidName(name))
        }
    }

    /// The normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace prefix, `<name>--`.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}{NAMESPACE_SEPARATOR}", self.0)
    }

    /// `resource` with the namespace prefix applied.
    #[must_use]
    pub fn prefixed(&self, resource: &str) -> String {
        format!("{}{NAMESPACE_SEPARATOR}{resource}", self.0)
    }

    /// Name of the systemd service generated from `main.container`.
    #[must_use]
    pub fn main_service(&self) -> String {
        self.prefixed(&format!("{MAIN_UNIT_STEM}.service"))
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Desired end state of a deployment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Files deployed and the service manager reloaded; no lifecycle management.
    #[default]
    Installed,
    /// As `Installed`, and the main service is running.
    Started,
    /// As `Installed`, and the application is restarted on every run.
    Restarted,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Installed => "installed",
            Self::Started => "started",
            Self::Restarted => "restarted",
        })
    }
}

/// Recognised quadlet unit kinds, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadletKind {
    /// `.container`
    Container,
    /// `.volume`
    Volume,
    /// `.network`
    Network,
    /// `.pod`
    Pod,
    /// `.kube`
    Kube,
}

impl QuadletKind {
    /// Every kind, in the order extensions are documented.
    pub const ALL: [Self; 5] = [
        Self::Container,
        Self::Volume,
        Self::Network,
        Self::Pod,
        Self::Kube,
    ];

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Volume => "volume",
            Self::Network => "network",
            Self::Pod => "pod",
            Self::Kube => "kube",
        }
    }

    /// Kind for a bare extension (`"container"`), if recognised.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }

    /// Kind for a filename (`"main.container"`), if recognised.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The `(section, directive)` pair that carries this kind's identity,
    /// e.g. `("Container", "ContainerName")`. `.kube` units have none.
    #[must_use]
    pub const fn identity(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Container => Some(("Container", "ContainerName")),
            Self::Pod => Some(("Pod", "PodName")),
            Self::Volume => Some(("Volume", "VolumeName")),
            Self::Network => Some(("Network", "NetworkName")),
            Self::Kube => None,
        }
    }

    /// Whether cross-references in this kind are namespace-prefixed.
    #[must_use]
    pub const fn prefixes_references(self) -> bool {
        matches!(self, Self::Container | Self::Pod | Self::Kube)
    }

    /// Whether `init.d`/`config.d` volume sources are redirected in this kind.
    #[must_use]
    pub const fn redirects_volume_paths(self) -> bool {
        matches!(self, Self::Container | Self::Pod)
    }

    /// Whether this kind may own `init.d`/`config.d` subdirectories.
    #[must_use]
    pub const fn owns_aux_dirs(self) -> bool {
        matches!(self, Self::Container | Self::Pod)
    }
}

/// Which auxiliary tree a file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuxKind {
    /// `init.d/<unit>/…`, deployed under `<app-base>/<app>/init/<unit>/`.
    Init,
    /// `config.d/<unit>/…`, deployed under `<app-base>/<app>/config/<unit>/`.
    Config,
}

impl AuxKind {
    /// Both kinds, in processing order.
    pub const ALL: [Self; 2] = [Self::Init, Self::Config];

    /// Directory name inside the source tree.
    #[must_use]
    pub const fn source_dir(self) -> &'static str {
        match self {
            Self::Init => "init.d",
            Self::Config => "config.d",
        }
    }

    /// Directory name inside the deployed application directory.
    #[must_use]
    pub const fn deploy_dir(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Config => "config",
        }
    }
}

/// Deployment roots on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPaths {
    /// Directory the quadlet generator reads units from.
    pub unit_dir: PathBuf,
    /// Parent of every per-application data directory.
    pub app_base: PathBuf,
}

impl DeployPaths {
    /// `<unit-dir>/<app>--<filename>`.
    #[must_use]
    pub fn unit_destination(&self, app: &AppName, filename: &str) -> PathBuf {
        self.unit_dir.join(app.prefixed(filename))
    }

    /// `<app-base>/<app>/<init|config>/<unit_stem>`, rendered as a string
    /// with `/` separators so it can be written into unit files.
    #[must_use]
    pub fn aux_root(&self, app: &AppName, kind: AuxKind, unit_stem: &str) -> String {
        let base = self.app_base.to_string_lossy();
        let base = base.trim_end_matches('/');
        format!("{base}/{app}/{}/{unit_stem}", kind.deploy_dir())
    }

    /// `<app-base>/<app>/<init|config>/<unit_stem>/<relative_path>`.
    #[must_use]
    pub fn aux_destination(
        &self,
        app: &AppName,
        kind: AuxKind,
        unit_stem: &str,
        relative_path: &Path,
    ) -> PathBuf {
        self.app_base
            .join(app.as_str())
            .join(kind.deploy_dir())
            .join(unit_stem)
            .join(relative_path)
    }
}

/// Inputs for one deployment run. Immutable once validated.
#[derive(Debug, Clone)]
pub struct Application {
    /// Validated name.
    pub name: AppName,
    /// Root of the application source tree.
    pub source_tree: PathBuf,
    /// Requested end state.
    pub desired_state: DesiredState,
    /// Treat every file as changed.
    pub force: bool,
    /// Timeout for lifecycle commands.
    pub timeout: Duration,
}

/// A quadlet unit read from `quadlets/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    /// Original filename (`backend.container`).
    pub filename: String,
    /// Filename without extension (`backend`).
    pub stem: String,
    /// Kind derived from the extension.
    pub kind: QuadletKind,
    /// Rendered, not yet preprocessed, content.
    pub raw_content: String,
    /// `<unit-dir>/<app>--<filename>`.
    pub destination: PathBuf,
}

/// A file from `init.d/<unit>/` or `config.d/<unit>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxFile {
    /// Stem of the owning `.container`/`.pod` unit.
    pub unit_stem: String,
    /// Path relative to the unit's subdirectory.
    pub relative_path: PathBuf,
    /// Rendered content, deployed verbatim.
    pub raw_content: String,
    /// `<app-base>/<app>/<init|config>/<unit_stem>/<relative_path>`.
    pub destination: PathBuf,
    /// Which auxiliary tree the file came from.
    pub kind: AuxKind,
}

/// Final content for every destination, plus the deployed unit filenames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    files: BTreeMap<PathBuf, String>,
    quadlet_files: Vec<String>,
}

impl DeploymentPlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preprocessed unit under its destination.
    pub fn add_unit(&mut self, app: &AppName, unit: UnitFile, content: String) {
        self.quadlet_files.push(app.prefixed(&unit.filename));
        self.files.insert(unit.destination, content);
    }

    /// Add an auxiliary file under its destination.
    pub fn add_aux(&mut self, aux: AuxFile) {
        self.files.insert(aux.destination, aux.raw_content);
    }

    /// Planned `(destination, content)` pairs, ordered by destination.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    /// Content planned for `path`, if any.
    #[must_use]
    pub fn content(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Deployed unit filenames (`<app>--<filename>`) in discovery order.
    #[must_use]
    pub fn quadlet_files(&self) -> &[String] {
        &self.quadlet_files
    }

    /// Number of planned files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
