//! Checksum-based change detection for a deployment plan.
//!
//! A destination is changed when it is missing, not a regular file,
//! unreadable, or its SHA-256 differs from the planned content. Any byte
//! difference counts, including line endings and trailing newlines.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::model::DeploymentPlan;
use crate::resources::{DeployedFile, Resource};

/// Lowercase hex SHA-256 digest of `bytes`.
///
/// # Examples
///
/// ```
/// use quadlet_app::idempotency::checksum;
///
/// assert_eq!(
///     checksum(b"hello world"),
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
#[must_use]
pub fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Whether `path` would change if `content` were written to it.
#[must_use]
pub fn file_changed(path: &Path, content: &str) -> bool {
    DeployedFile::new(path, content).needs_change()
}

/// Destinations in `plan` that need writing. With `force`, every
/// destination is returned without touching the filesystem.
#[must_use]
pub fn changed_files(plan: &DeploymentPlan, force: bool) -> Vec<PathBuf> {
    plan.files()
        .filter(|(path, content)| force || file_changed(path, content))
        .map(|(path, _)| path.to_path_buf())
        .collect()
}

/// Whether any file in `plan` needs writing. `force` short-circuits to
/// `true` without reading anything.
#[must_use]
pub fn needs_deployment(plan: &DeploymentPlan, force: bool) -> bool {
    force
        || plan.files().any(|(path, content)| {
            let changed = file_changed(path, content);
            if changed {
                tracing::debug!(path = %path.display(), "content differs");
            }
            changed
        })
}
