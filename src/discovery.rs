//! Enumerate the files of an application source tree.
//!
//! Output is lexicographically sorted at every level so plans, logs and
//! the deployed unit list are stable from run to run.
use std::path::{Path, PathBuf};

use crate::error::DeployError;
use crate::model::{AuxKind, QuadletKind};
use crate::validate::QUADLETS_DIR;

/// A file found under `init.d/<unit>/` or `config.d/<unit>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAux {
    /// Which auxiliary tree the file is in.
    pub kind: AuxKind,
    /// Name of the subdirectory, i.e. the owning unit's stem.
    pub unit_stem: String,
    /// Path relative to the subdirectory.
    pub relative_path: PathBuf,
    /// Absolute path of the source file.
    pub source_path: PathBuf,
}

/// Every deployable file in a source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredTree {
    /// Filenames in `quadlets/` with a recognised extension.
    pub quadlets: Vec<String>,
    /// Auxiliary files, `init.d` before `config.d`.
    pub aux: Vec<DiscoveredAux>,
}

/// Walk `source_tree`.
///
/// # Errors
///
/// Returns [`DeployError::Io`] if a directory cannot be listed.
pub fn discover(source_tree: &Path) -> Result<DiscoveredTree, DeployError> {
    let quadlets_dir = source_tree.join(QUADLETS_DIR);
    let quadlets: Vec<String> = sorted_entries(&quadlets_dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|name| QuadletKind::from_filename(name).is_some())
        .collect();

    let mut aux = Vec::new();
    for kind in AuxKind::ALL {
        let root = source_tree.join(kind.source_dir());
        if !root.is_dir() {
            continue;
        }
        for unit_dir in sorted_entries(&root)?.into_iter().filter(|p| p.is_dir()) {
            let Some(unit_stem) = unit_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let mut files = Vec::new();
            walk_files(&unit_dir, &mut files)?;
            for source_path in files {
                let relative_path = source_path
                    .strip_prefix(&unit_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                aux.push(DiscoveredAux {
                    kind,
                    unit_stem: unit_stem.clone(),
                    relative_path,
                    source_path,
                });
            }
        }
    }

    tracing::debug!(
        quadlets = quadlets.len(),
        aux = aux.len(),
        "discovered source tree"
    );
    Ok(DiscoveredTree { quadlets, aux })
}

/// Depth-first walk collecting regular files, sorted at each level.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DeployError> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            walk_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| DeployError::io("read directory", dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DeployError::io("read directory", dir, e))?;
    entries.sort();
    Ok(entries)
}
