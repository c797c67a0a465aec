//! Command: structural validation only.
use anyhow::Result;
use std::io::Write;

use crate::cli::{GlobalOpts, SourceOpts};
use crate::logging::Logger;
use crate::report;

/// Validate the source tree and print the normalized application name.
///
/// # Errors
///
/// Returns the validator's error.
pub fn run(
    global: &GlobalOpts,
    opts: &SourceOpts,
    log: &Logger,
    out: &mut impl Write,
) -> Result<()> {
    let source = super::resolve_source(opts, log)?;
    if global.json {
        report::write_json(
            out,
            &serde_json::json!({
                "valid": true,
                "application_name": source.name.as_str(),
                "service_name": source.name.main_service(),
            }),
        )?;
    } else {
        writeln!(out, "{}", source.name)?;
    }
    Ok(())
}
