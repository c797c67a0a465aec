//! Jinja templating applied to every source file before deployment.
//!
//! Files are rendered with `minijinja` in strict mode: an undefined
//! variable is an error, filters and block tags work as in Jinja. Podman
//! Go-template placeholders (`{{.State.Health}}`) are not Jinja and pass
//! through untouched.
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use regex::{Captures, Regex};

use crate::error::TemplateError;

/// Variable every render receives, holding the application name.
pub const APP_NAME_VAR: &str = "quadlet_app_name";

static GO_TEMPLATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*\.[^}]*\}\}").ok());

/// Turns raw source bytes into deployable text.
pub trait Renderer {
    /// Decode and render `bytes` read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the bytes are not UTF-8 or the template
    /// fails to parse or render.
    fn render(&self, path: &Path, bytes: Vec<u8>) -> Result<String, TemplateError>;
}

/// Swap each Go-template placeholder for a generated variable bound to its
/// original text, so Jinja prints it back unchanged.
fn protect_go_templates(text: &str, vars: &mut BTreeMap<String, String>) -> String {
    let Some(re) = GO_TEMPLATE.as_ref() else {
        return text.to_string();
    };
    let mut next = 0usize;
    re.replace_all(text, |caps: &Captures<'_>| {
        let key = format!("__go_template_{next}");
        next += 1;
        let original = caps.get(0).map_or("", |m| m.as_str());
        vars.insert(key.clone(), original.to_string());
        format!("{{{{ {key} }}}}")
    })
    .into_owned()
}

/// Jinja environment matching the conventions deployed files are written
/// for: no escaping, trailing newline kept, block tags eat their newline.
fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env
}

/// [`Renderer`] backed by a flat variable map.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use quadlet_app::template::{Renderer, VarRenderer};
///
/// let mut r = VarRenderer::new("shop");
/// r.insert("image", "nginx:1.27");
/// let out = r.render(Path::new("main.container"), b"Image={{ image }}".to_vec()).unwrap();
/// assert_eq!(out, "Image=nginx:1.27");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VarRenderer {
    vars: BTreeMap<String, String>,
}

impl VarRenderer {
    /// Create a renderer with [`APP_NAME_VAR`] bound to `app_name`.
    #[must_use]
    pub fn new(app_name: &str) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(APP_NAME_VAR.to_string(), app_name.to_string());
        Self { vars }
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Bind every pair from `vars`.
    pub fn extend(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        self.vars.extend(vars);
    }

    /// Value bound to `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl Renderer for VarRenderer {
    fn render(&self, path: &Path, bytes: Vec<u8>) -> Result<String, TemplateError> {
        let text = String::from_utf8(bytes).map_err(|source| TemplateError::NotUtf8 {
            path: path.to_path_buf(),
            source,
        })?;

        let mut vars = self.vars.clone();
        let source = protect_go_templates(&text, &mut vars);
        let name = path.display().to_string();
        environment()
            .render_named_str(&name, &source, &vars)
            .map_err(|source| TemplateError::Render {
                path: path.to_path_buf(),
                source,
            })
    }
}
