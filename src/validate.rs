//! Structural validation of an application source tree.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the source tree is a directory containing `quadlets/`
//! 2. the application name matches the naming grammar
//! 3. `quadlets/main.container` is a regular file
//! 4. every `init.d/X` and `config.d/X` subdirectory maps to exactly one
//!    `quadlets/X.container` or `quadlets/X.pod`
use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::model::{AppName, AuxKind, MAIN_UNIT_STEM, QuadletKind};

/// Name of the mandatory unit directory.
pub const QUADLETS_DIR: &str = "quadlets";

/// Validate `source_tree` and `raw_name`, returning the normalized name.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(source_tree: &Path, raw_name: &str) -> Result<AppName, ValidationError> {
    validate_source_directory(source_tree)?;
    let name = AppName::parse(raw_name)?;
    validate_main_container(source_tree)?;
    for kind in AuxKind::ALL {
        validate_aux_structure(source_tree, kind)?;
    }
    Ok(name)
}

fn validate_source_directory(source_tree: &Path) -> Result<(), ValidationError> {
    if !source_tree.exists() {
        return Err(ValidationError::SourceNotFound(source_tree.to_path_buf()));
    }
    if !source_tree.is_dir() {
        return Err(ValidationError::SourceNotDirectory(
            source_tree.to_path_buf(),
        ));
    }
    let quadlets = source_tree.join(QUADLETS_DIR);
    if !quadlets.is_dir() {
        return Err(ValidationError::MissingQuadletsDir(quadlets));
    }
    Ok(())
}

fn validate_main_container(source_tree: &Path) -> Result<(), ValidationError> {
    let main = source_tree
        .join(QUADLETS_DIR)
        .join(format!("{MAIN_UNIT_STEM}.container"));
    if main.is_file() {
        Ok(())
    } else {
        Err(ValidationError::MissingMainContainer(main))
    }
}

fn validate_aux_structure(source_tree: &Path, kind: AuxKind) -> Result<(), ValidationError> {
    let dir = source_tree.join(kind.source_dir());
    if !dir.is_dir() {
        return Ok(());
    }

    let quadlet_files = list_names(&source_tree.join(QUADLETS_DIR), |p| p.is_file())?;

    for entry in list_names(&dir, |p| p.is_dir())? {
        let entry_path = Path::new(&entry);
        let suffixed = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(QuadletKind::from_extension)
            .is_some_and(QuadletKind::owns_aux_dirs);
        if suffixed {
            return Err(ValidationError::SuffixedAuxDir {
                dir: kind.source_dir(),
                stem: entry_path
                    .file_stem()
                    .map_or_else(String::new, |s| s.to_string_lossy().into_owned()),
                entry,
            });
        }

        let matches: Vec<String> = quadlet_files
            .iter()
            .filter(|f| owning_unit_stem(f) == Some(entry.as_str()))
            .cloned()
            .collect();

        match matches.len() {
            0 => {
                return Err(ValidationError::OrphanedAuxDir {
                    dir: kind.source_dir(),
                    entry,
                });
            }
            1 => {}
            _ => {
                return Err(ValidationError::AmbiguousAuxDir {
                    dir: kind.source_dir(),
                    entry,
                    matches,
                });
            }
        }
    }
    Ok(())
}

/// Stem of `filename` if it is a `.container` or `.pod` unit.
fn owning_unit_stem(filename: &str) -> Option<&str> {
    let kind = QuadletKind::from_filename(filename)?;
    if !kind.owns_aux_dirs() {
        return None;
    }
    filename.strip_suffix(kind.extension())?.strip_suffix('.')
}

/// Sorted names of the entries in `dir` whose path satisfies `keep`.
fn list_names(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>, ValidationError> {
    let unreadable = |source| ValidationError::UnreadableDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path: PathBuf = entry.map_err(unreadable)?.path();
        if keep(&path)
            && let Some(name) = path.file_name()
        {
            names.push(name.to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
