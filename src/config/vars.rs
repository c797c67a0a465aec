//! Template variables from `--vars-file` and `--var KEY=VALUE`.
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::Path;

use super::toml_loader::load_config;

/// Parse a `KEY=VALUE` argument. The value may contain further `=`.
///
/// # Errors
///
/// Returns a message if there is no `=` or the key is empty.
pub fn parse_var(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{arg}'")),
    }
}

/// Load a flat TOML table of variables. Strings, integers, floats and
/// booleans are accepted and stringified.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds a
/// table, array or datetime value.
pub fn load_vars_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let table: toml::Table = load_config(path)?;
    let mut vars = BTreeMap::new();
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            other => bail!(
                "variable '{key}' in {} must be a string, number or boolean, found {}",
                path.display(),
                other.type_str()
            ),
        };
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Merge variables from an optional file with command-line pairs; later
/// command-line pairs win.
///
/// # Errors
///
/// Propagates errors from [`load_vars_file`].
pub fn collect(
    vars_file: Option<&Path>,
    cli_vars: &[(String, String)],
) -> Result<BTreeMap<String, String>> {
    let mut vars = match vars_file {
        Some(path) => load_vars_file(path)?,
        None => BTreeMap::new(),
    };
    vars.extend(cli_vars.iter().cloned());
    Ok(vars)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_splits_on_first_equals() {
        assert_eq!(
            parse_var("dsn=postgres://u:p@db/x?a=b").unwrap(),
            ("dsn".to_string(), "postgres://u:p@db/x?a=b".to_string())
        );
        assert_eq!(parse_var("empty=").unwrap(), ("empty".to_string(), String::new()));
    }

    #[test]
    fn parse_var_rejects_malformed() {
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn vars_file_stringifies_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.toml");
        std::fs::write(&path, "image = \"nginx\"\nport = 8080\ndebug = true\nratio = 0.5\n")
            .unwrap();
        let vars = load_vars_file(&path).unwrap();
        assert_eq!(vars["image"], "nginx");
        assert_eq!(vars["port"], "8080");
        assert_eq!(vars["debug"], "true");
        assert_eq!(vars["ratio"], "0.5");
    }

    #[test]
    fn vars_file_rejects_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.toml");
        std::fs::write(&path, "[nested]\nx = 1\n").unwrap();
        let err = load_vars_file(&path).unwrap_err();
        assert!(err.to_string().contains("'nested'"), "got: {err}");
    }

    #[test]
    fn cli_vars_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.toml");
        std::fs::write(&path, "tag = \"1.0\"\nimage = \"nginx\"\n").unwrap();
        let vars = collect(Some(&path), &[("tag".to_string(), "2.0".to_string())]).unwrap();
        assert_eq!(vars["tag"], "2.0");
        assert_eq!(vars["image"], "nginx");
    }
}
