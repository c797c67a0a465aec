//! Assemble the final content of every deployed file.
use std::path::Path;

use crate::discovery::{DiscoveredAux, DiscoveredTree};
use crate::error::DeployError;
use crate::model::{AppName, AuxFile, DeployPaths, DeploymentPlan, QuadletKind, UnitFile};
use crate::preprocess::Preprocessor;
use crate::template::Renderer;
use crate::validate::QUADLETS_DIR;

/// Read, render and (for units) preprocess every discovered file.
///
/// Units are preprocessed exactly once, from freshly rendered source.
/// Auxiliary files are rendered and deployed verbatim.
///
/// # Errors
///
/// Returns [`DeployError::Io`] if a source file cannot be read, or
/// [`DeployError::Template`] if it cannot be decoded or rendered.
pub fn build_plan(
    app: &AppName,
    source_tree: &Path,
    tree: &DiscoveredTree,
    renderer: &dyn Renderer,
    paths: &DeployPaths,
) -> Result<DeploymentPlan, DeployError> {
    let preprocessor = Preprocessor::new(app, paths);
    let mut plan = DeploymentPlan::new();

    for filename in &tree.quadlets {
        let unit = read_unit(app, source_tree, filename, renderer, paths)?;
        let content = preprocessor.preprocess(&unit.raw_content, &unit.filename);
        tracing::debug!(unit = %unit.filename, dest = %unit.destination.display(), "planned unit");
        plan.add_unit(app, unit, content);
    }

    for found in &tree.aux {
        let aux = read_aux(app, found, renderer, paths)?;
        tracing::debug!(dest = %aux.destination.display(), "planned aux file");
        plan.add_aux(aux);
    }

    Ok(plan)
}

fn read_unit(
    app: &AppName,
    source_tree: &Path,
    filename: &str,
    renderer: &dyn Renderer,
    paths: &DeployPaths,
) -> Result<UnitFile, DeployError> {
    let source = source_tree.join(QUADLETS_DIR).join(filename);
    let Some(kind) = QuadletKind::from_filename(filename) else {
        return Err(DeployError::io(
            "classify",
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unrecognised unit extension"),
        ));
    };
    let stem = Path::new(filename)
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let raw_content = render_file(&source, renderer)?;
    Ok(UnitFile {
        filename: filename.to_string(),
        stem,
        kind,
        raw_content,
        destination: paths.unit_destination(app, filename),
    })
}

fn read_aux(
    app: &AppName,
    found: &DiscoveredAux,
    renderer: &dyn Renderer,
    paths: &DeployPaths,
) -> Result<AuxFile, DeployError> {
    let raw_content = render_file(&found.source_path, renderer)?;
    Ok(AuxFile {
        unit_stem: found.unit_stem.clone(),
        relative_path: found.relative_path.clone(),
        raw_content,
        destination: paths.aux_destination(
            app,
            found.kind,
            &found.unit_stem,
            &found.relative_path,
        ),
        kind: found.kind,
    })
}

fn render_file(path: &Path, renderer: &dyn Renderer) -> Result<String, DeployError> {
    let bytes = std::fs::read(path).map_err(|e| DeployError::io("read", path, e))?;
    Ok(renderer.render(path, bytes)?)
}
