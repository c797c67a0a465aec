//! Deployed file content as a checkable resource.
use std::path::Path;

use super::{Resource, ResourceState, fs};
use crate::error::DeployError;
use crate::idempotency::checksum;

/// A file whose on-disk content must equal a planned string.
#[derive(Debug, Clone)]
pub struct DeployedFile<'a> {
    /// Destination path.
    pub path: &'a Path,
    /// Desired content.
    pub content: &'a str,
}

impl<'a> DeployedFile<'a> {
    /// Create a new deployed file resource.
    #[must_use]
    pub const fn new(path: &'a Path, content: &'a str) -> Self {
        Self { path, content }
    }
}

impl Resource for DeployedFile<'_> {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn current_state(&self) -> ResourceState {
        if !self.path.exists() {
            return ResourceState::Missing;
        }
        if !self.path.is_file() {
            return ResourceState::Invalid {
                reason: "not a regular file".to_string(),
            };
        }
        match std::fs::read(self.path) {
            Ok(existing) => {
                let current = checksum(&existing);
                if current == checksum(self.content.as_bytes()) {
                    ResourceState::Correct
                } else {
                    ResourceState::Incorrect { current }
                }
            }
            Err(e) => ResourceState::Invalid {
                reason: e.to_string(),
            },
        }
    }

    fn apply(&self) -> Result<(), DeployError> {
        fs::ensure_parent_dir(self.path)?;
        fs::write_file(self.path, self.content.as_bytes())
    }
}
