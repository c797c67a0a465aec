//! Build script embedding version information.

use std::process::Command;

fn main() {
    // Prefer QUADLET_APP_VERSION if set (e.g., by a release pipeline),
    // otherwise fall back to git describe for local builds.
    if let Ok(version) = std::env::var("QUADLET_APP_VERSION") {
        println!("cargo:rustc-env=QUADLET_APP_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !version.is_empty() {
            println!("cargo:rustc-env=QUADLET_APP_VERSION={version}");
        }
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=QUADLET_APP_VERSION");
}
