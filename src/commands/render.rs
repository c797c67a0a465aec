//! Command: print the deployment plan without touching the host.
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::cli::{GlobalOpts, RenderOpts};
use crate::discovery::discover;
use crate::logging::Logger;
use crate::model::{DeployPaths, DeploymentPlan};
use crate::plan::build_plan;
use crate::report;

#[derive(Debug, Serialize)]
struct RenderedFile<'a> {
    path: &'a Path,
    content: &'a str,
}

/// Run the render command.
///
/// # Errors
///
/// Returns an error if validation, settings loading or planning fails.
pub fn run(
    global: &GlobalOpts,
    opts: &RenderOpts,
    log: &Logger,
    out: &mut impl Write,
) -> Result<()> {
    let settings = super::load_settings(global, &opts.paths, None)?;
    let plan = plan(opts, &settings.paths(), log)?;
    if global.json {
        let files: Vec<_> = plan
            .files()
            .map(|(path, content)| RenderedFile { path, content })
            .collect();
        report::write_json(out, &files)?;
    } else {
        write_plan(out, &plan)?;
    }
    Ok(())
}

fn plan(opts: &RenderOpts, paths: &DeployPaths, log: &Logger) -> Result<DeploymentPlan> {
    let source = super::resolve_source(&opts.source, log)?;
    log.stage("Rendering");
    let tree = discover(&source.path)?;
    let renderer = super::renderer_for(&source.name, &opts.vars)?;
    Ok(build_plan(&source.name, &source.path, &tree, &renderer, paths)?)
}

/// One `==> <destination>` header per file followed by its content.
fn write_plan(out: &mut impl Write, plan: &DeploymentPlan) -> std::io::Result<()> {
    for (path, content) in plan.files() {
        writeln!(out, "==> {}", path.display())?;
        out.write_all(content.as_bytes())?;
        if !content.is_empty() && !content.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cli::{PathOpts, SourceOpts, VarOpts};
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("shop");
        fs::create_dir_all(src.join("quadlets")).unwrap();
        fs::write(
            src.join("quadlets/main.container"),
            "[Container]\nImage={{ image }}",
        )
        .unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        dir
    }

    fn opts(dir: &Path) -> RenderOpts {
        RenderOpts {
            source: SourceOpts {
                src: dir.join("shop"),
                name: None,
            },
            paths: PathOpts {
                unit_dir: Some(dir.join("units")),
                app_base: Some(dir.join("srv")),
            },
            vars: VarOpts {
                vars: vec![("image".to_string(), "nginx".to_string())],
                vars_file: None,
            },
        }
    }

    fn global(dir: &Path, json: bool) -> GlobalOpts {
        GlobalOpts {
            json,
            config: Some(dir.join("config.toml")),
            ..GlobalOpts::default()
        }
    }

    #[test]
    fn human_output_has_headers_and_trailing_newline() {
        let dir = fixture();
        let mut out = Vec::new();
        run(&global(dir.path(), false), &opts(dir.path()), &Logger::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("==> "));
        assert!(text.contains("shop--main.container\n"));
        assert!(text.ends_with("ContainerName=shop--main\nImage=nginx\n"));
        assert!(!dir.path().join("units").exists(), "render must not write");
    }

    #[test]
    fn json_output_lists_files() {
        let dir = fixture();
        let mut out = Vec::new();
        run(&global(dir.path(), true), &opts(dir.path()), &Logger::default(), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let files = json.as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0]["content"],
            "[Container]\nContainerName=shop--main\nImage=nginx"
        );
    }
}
