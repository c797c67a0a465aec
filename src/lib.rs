//! Quadlet application deployment engine.
//!
//! Deploys a directory of podman quadlet units, plus per-unit `init.d/`
//! and `config.d/` data, as one namespaced application managed by systemd.
//! Every unit is renamed `<app>--<unit>` and its cross-references are
//! rewritten to match, so independently deployed applications can share
//! one unit directory without colliding.
//!
//! A run moves through four layers:
//!
//! - **[`validate`]**: structural checks on the source tree and the name
//! - **[`plan`]**: render templates, apply the [`preprocess`] rewrites and
//!   map every file to its destination
//! - **[`idempotency`]**: compare planned content with what is on disk
//! - **[`orchestrator`]**: write what changed, validate and reload units,
//!   then start or restart services through [`systemd`]
//!
//! [`commands`] wires these together for the `quadlet-app` binary.
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod idempotency;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod plan;
pub mod preprocess;
pub mod report;
pub mod resources;
pub mod systemd;
pub mod template;
pub mod validate;
