//! Command: print version information.
use std::io::{self, Write};

/// Version string baked in at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("QUADLET_APP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to `out`.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn run(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "quadlet-app {}", version())
}
