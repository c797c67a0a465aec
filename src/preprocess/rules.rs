//! Line-level rewrites: reference prefixing and aux path redirection.
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{AppName, AuxKind, DeployPaths};

/// Directives whose values may name another unit of the same application.
pub const REFERENCE_DIRECTIVES: [&str; 12] = [
    "Network",
    "Pod",
    "Volume",
    "Wants",
    "Requires",
    "Requisite",
    "BindsTo",
    "PartOf",
    "Upholds",
    "Conflicts",
    "Before",
    "After",
];

/// Suffixes that mark a value as a reference to a quadlet or its service.
const REFERENCE_SUFFIXES: [&str; 6] = [
    ".network",
    ".pod",
    ".volume",
    ".container",
    ".kube",
    ".service",
];

static VOLUME_REFERENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([^/][^:]*\.(volume|network|pod))(:.*)?$").ok());

/// A line split into leading whitespace, directive and value.
struct Assignment<'a> {
    indent: &'a str,
    directive: &'a str,
    value: &'a str,
}

impl<'a> Assignment<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let body = line.trim_start();
        let indent = line.get(..line.len() - body.len()).unwrap_or("");
        let (directive, value) = body.split_once('=')?;
        Some(Self {
            indent,
            directive,
            value,
        })
    }

    fn with_value(&self, value: &str) -> String {
        format!("{}{}={value}", self.indent, self.directive)
    }
}

/// Prefix unit references on `line` with the application namespace.
///
/// `Volume=` only prefixes a leading `*.volume`/`*.network`/`*.pod` source,
/// keeping any `:dest[:opts]` tail. Other directives prefix the whole value
/// when it ends with a unit suffix and is not an absolute path.
#[must_use]
pub fn prefix_references(line: &str, app: &AppName) -> String {
    let Some(assignment) = Assignment::parse(line) else {
        return line.to_string();
    };
    if !REFERENCE_DIRECTIVES.contains(&assignment.directive) {
        return line.to_string();
    }

    if assignment.directive == "Volume" {
        if let Some(caps) = VOLUME_REFERENCE
            .as_ref()
            .and_then(|re| re.captures(assignment.value))
            && let Some(reference) = caps.get(1)
        {
            let rest = caps.get(3).map_or("", |m| m.as_str());
            return assignment.with_value(&format!("{}{rest}", app.prefixed(reference.as_str())));
        }
        return line.to_string();
    }

    let value = assignment.value;
    if !value.starts_with('/') && REFERENCE_SUFFIXES.iter().any(|s| value.ends_with(s)) {
        return assignment.with_value(&app.prefixed(value));
    }
    line.to_string()
}

/// Redirect `Volume=init.d…`/`Volume=config.d…` sources to the deployed
/// auxiliary directory of `unit_stem`.
#[must_use]
pub fn redirect_aux_volume(
    line: &str,
    app: &AppName,
    paths: &DeployPaths,
    unit_stem: &str,
) -> String {
    let Some(assignment) = Assignment::parse(line) else {
        return line.to_string();
    };
    if assignment.directive != "Volume" {
        return line.to_string();
    }

    let (source, rest) = match assignment.value.find(':') {
        Some(idx) => assignment.value.split_at(idx),
        None => (assignment.value, ""),
    };
    if source.ends_with(".volume") || source.starts_with('/') {
        return line.to_string();
    }

    for kind in AuxKind::ALL {
        if let Some(subpath) = source.strip_prefix(kind.source_dir()) {
            let subpath = subpath.strip_prefix('/').unwrap_or(subpath);
            let mut target = paths.aux_root(app, kind, unit_stem);
            if !subpath.is_empty() {
                target.push('/');
                target.push_str(subpath);
            }
            return assignment.with_value(&format!("{target}{rest}"));
        }
    }
    line.to_string()
}
