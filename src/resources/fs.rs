//! File-system helpers for deployed resources.
use std::fs::{self, DirBuilder};
use std::path::Path;

use crate::error::DeployError;

/// Mode for directories created during deployment.
pub const DIR_MODE: u32 = 0o755;

/// Mode for deployed files.
pub const FILE_MODE: u32 = 0o644;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) with [`DIR_MODE`] if necessary. Existing directories keep
/// their mode.
///
/// # Errors
///
/// Returns [`DeployError::Io`] if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), DeployError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(DIR_MODE);
    }
    builder
        .create(parent)
        .map_err(|e| DeployError::io("create directory", parent, e))
}

/// Write `content` to `path` and set [`FILE_MODE`].
///
/// # Errors
///
/// Returns [`DeployError::Io`] if the file cannot be written or its mode set.
pub fn write_file(path: &Path, content: &[u8]) -> Result<(), DeployError> {
    fs::write(path, content).map_err(|e| DeployError::io("write", path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))
            .map_err(|e| DeployError::io("set permissions on", path, e))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ensure_parent_dir_creates_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/c/file.conf");
        ensure_parent_dir(&file).unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn ensure_parent_dir_is_noop_for_existing() {
        let dir = tempfile::tempdir().unwrap();
        ensure_parent_dir(&dir.path().join("file")).unwrap();
    }

    #[test]
    fn ensure_parent_dir_fails_when_parent_is_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blocker"), "").unwrap();
        let err = ensure_parent_dir(&dir.path().join("blocker/child")).unwrap_err();
        assert!(matches!(err, DeployError::Io { action: "create directory", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn modes_are_applied() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new/unit.container");
        ensure_parent_dir(&file).unwrap();
        write_file(&file, b"[Container]\n").unwrap();

        let dir_mode = fs::metadata(dir.path().join("new")).unwrap().permissions().mode();
        let file_mode = fs::metadata(&file).unwrap().permissions().mode();
        // umask may clear bits from the directory mode but never adds any
        assert_eq!(dir_mode & 0o777 & !DIR_MODE, 0);
        assert_eq!(file_mode & 0o777, FILE_MODE);
    }
}
