//! Idempotent resource primitives (check + apply pattern).
pub mod deployed_file;
pub mod fs;

pub use deployed_file::DeployedFile;

use crate::error::DeployError;

/// State of a resource on the host.
///
/// # Examples
///
/// ```
/// use quadlet_app::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let stale = ResourceState::Incorrect { current: "e3b0c442…".into() };
/// let blocked = ResourceState::Invalid { reason: "not a regular file".into() };
///
/// assert_ne!(missing, correct);
/// assert!(stale.is_changed() && blocked.is_changed() && !correct.is_changed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// The current value of the resource (a content checksum for files).
        current: String,
    },
    /// Resource exists but cannot be compared (wrong type, unreadable).
    Invalid {
        /// Reason why the resource cannot be compared.
        reason: String,
    },
}

impl ResourceState {
    /// Whether anything other than [`ResourceState::Correct`].
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        !matches!(self, Self::Correct)
    }
}

/// Unified interface for resources that can be checked and applied.
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state of the resource.
    ///
    /// Never fails: conditions that prevent a comparison are reported as
    /// [`ResourceState::Invalid`].
    fn current_state(&self) -> ResourceState;

    /// Bring the resource to its desired state unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Io`] if directories or files cannot be written.
    fn apply(&self) -> Result<(), DeployError>;

    /// Determine if the resource needs to be changed.
    fn needs_change(&self) -> bool {
        self.current_state().is_changed()
    }
}
