//! Rewrites that namespace a unit file for its application.
//!
//! Three passes run over already-rendered text:
//!
//! - **name injection**: `ContainerName=`, `PodName=`, `VolumeName=` or
//!   `NetworkName=` is added right after the resource section header when
//!   missing, so the runtime object carries the `<app>--<stem>` name
//! - **reference prefixing** (`.container`, `.pod`, `.kube`): unit
//!   references in [`rules::REFERENCE_DIRECTIVES`] gain the `<app>--` prefix
//! - **path redirection** (`.container`, `.pod`): `Volume=init.d…` and
//!   `Volume=config.d…` sources point at the deployed auxiliary directory
//!
//! Injection runs first so the per-line passes see the final document.
//! Preprocessing is not idempotent: feed it pristine source exactly once.

mod document;
pub mod rules;

use std::path::Path;

pub use document::{Section, UnitDocument};

use crate::model::{AppName, DeployPaths, QuadletKind};

/// Applies every rewrite for one application.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor<'a> {
    app: &'a AppName,
    paths: &'a DeployPaths,
}

impl<'a> Preprocessor<'a> {
    /// Create a preprocessor for `app` deploying under `paths`.
    #[must_use]
    pub const fn new(app: &'a AppName, paths: &'a DeployPaths) -> Self {
        Self { app, paths }
    }

    /// Rewrite `content` of the unit named `filename`.
    ///
    /// Files with an unrecognised extension are returned unchanged.
    #[must_use]
    pub fn preprocess(&self, content: &str, filename: &str) -> String {
        let Some(kind) = QuadletKind::from_filename(filename) else {
            return content.to_string();
        };
        let stem = Path::new(filename)
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());

        let content = self.inject_name(content, kind, &stem);

        let prefix = kind.prefixes_references();
        let redirect = kind.redirects_volume_paths();
        if !prefix && !redirect {
            return content;
        }

        content
            .split('\n')
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return line.to_string();
                }
                let mut line = line.to_string();
                if prefix {
                    line = rules::prefix_references(&line, self.app);
                }
                if redirect {
                    line = rules::redirect_aux_volume(&line, self.app, self.paths, &stem);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Add the identity directive to the kind's section when it is absent.
    fn inject_name(&self, content: &str, kind: QuadletKind, stem: &str) -> String {
        let Some((section_name, directive)) = kind.identity() else {
            return content.to_string();
        };

        let mut doc = UnitDocument::parse(content);
        let Some(section) = doc.section_mut(section_name) else {
            return content.to_string();
        };
        if section.has_directive(directive) {
            return content.to_string();
        }

        section.insert_after_header(format!("{directive}={}", self.app.prefixed(stem)));
        tracing::trace!(directive, stem, "injected resource name");
        doc.render()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run(content: &str, filename: &str) -> String {
        let app = AppName::parse("shop").unwrap();
        let paths = DeployPaths {
            unit_dir: PathBuf::from("/etc/containers/systemd"),
            app_base: PathBuf::from("/srv"),
        };
        Preprocessor::new(&app, &paths).preprocess(content, filename)
    }

    #[test]
    fn volume_name_injected_after_header() {
        assert_eq!(
            run("[Volume]\nDriver=local\n", "main.volume"),
            "[Volume]\nVolumeName=shop--main\nDriver=local\n"
        );
    }

    #[test]
    fn existing_volume_name_is_kept() {
        let text = "[Volume]\nVolumeName=custom\n";
        assert_eq!(run(text, "main.volume"), text);
    }

    #[test]
    fn commented_name_does_not_count() {
        assert_eq!(
            run("[Network]\n#NetworkName=old\n", "app.network"),
            "[Network]\nNetworkName=shop--app\n#NetworkName=old\n"
        );
    }

    #[test]
    fn missing_section_means_no_injection() {
        let text = "[Unit]\nDescription=web\n";
        assert_eq!(run(text, "web.container"), text);
    }

    #[test]
    fn volume_and_network_units_are_not_prefixed() {
        let text = "[Volume]\nVolumeName=data\nNetwork=main.network\n";
        assert_eq!(run(text, "data.volume"), text);
    }

    #[test]
    fn kube_units_are_prefixed_but_not_redirected_or_named() {
        let text = "[Kube]\nYaml=app.yaml\nNetwork=main.network\nVolume=init.d:/x\n";
        assert_eq!(
            run(text, "app.kube"),
            "[Kube]\nYaml=app.yaml\nNetwork=shop--main.network\nVolume=init.d:/x\n"
        );
    }

    #[test]
    fn comments_and_blank_lines_are_untouched() {
        let text = "[Container]\nContainerName=x\n\n# Network=main.network\n   \n";
        assert_eq!(run(text, "main.container"), text);
    }

    #[test]
    fn unknown_extension_is_unchanged() {
        let text = "Network=main.network\n";
        assert_eq!(run(text, "notes.txt"), text);
    }

    #[test]
    fn injected_name_is_not_rewritten() {
        let out = run("[Pod]\nNetwork=main.network\n", "web.pod");
        assert_eq!(out, "[Pod]\nPodName=shop--web\nNetwork=shop--main.network\n");
    }
}
