#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Integration tests for the full deploy pipeline: validation, planning,
//! change detection and service-manager call ordering.

mod common;

use common::{Fixture, RecordingControl, read};
use quadlet_app::commands::deploy::execute;
use quadlet_app::logging::Logger;
use quadlet_app::model::DesiredState;
use quadlet_app::report::{DeployOutcome, FailureReport};

fn deploy(
    fx: &Fixture,
    control: &RecordingControl,
    state: DesiredState,
    force: bool,
) -> anyhow::Result<DeployOutcome> {
    execute(
        &fx.deploy_opts(state, force),
        &fx.settings(),
        control,
        &Logger::default(),
        false,
    )
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[test]
fn second_run_is_unchanged_and_silent() {
    let fx = Fixture::new("shop");
    fx.write("quadlets/main.network", "[Network]\n");

    let first = RecordingControl::default();
    let outcome = deploy(&fx, &first, DesiredState::Installed, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.msg, "quadlet files deployed");
    assert_eq!(first.calls(), ["generator -dryrun", "daemon-reload"]);

    let second = RecordingControl::default();
    let outcome = deploy(&fx, &second, DesiredState::Installed, false).unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.msg, "application already up to date");
    assert!(second.calls().is_empty(), "no service-manager calls expected");
}

#[test]
fn single_byte_change_is_detected() {
    let fx = Fixture::new("shop");
    fx.write("config.d/main/nginx.conf", "worker_processes 1;\n");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();

    fx.write("config.d/main/nginx.conf", "worker_processes 2;\n");
    let control = RecordingControl::default();
    let outcome = deploy(&fx, &control, DesiredState::Installed, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(
        read(&fx.app_base().join("shop/config/main/nginx.conf")),
        "worker_processes 2;\n"
    );
    assert_eq!(control.calls(), ["generator -dryrun", "daemon-reload"]);
}

#[test]
fn force_always_reports_changed() {
    let fx = Fixture::new("shop");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();

    let control = RecordingControl::default();
    let outcome = deploy(&fx, &control, DesiredState::Installed, true).unwrap();
    assert!(outcome.changed);
    assert_eq!(control.calls(), ["generator -dryrun", "daemon-reload"]);
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn files_land_in_namespaced_locations() {
    let fx = Fixture::new("shop");
    fx.write("quadlets/main.network", "[Network]\n")
        .write("quadlets/db.container", "[Container]\nImage=postgres:16\n")
        .write("init.d/db/schema.sql", "CREATE TABLE t ();\n");

    let outcome =
        deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();
    assert_eq!(outcome.application_name, "shop");
    assert_eq!(outcome.service_name, "shop--main.service");
    assert_eq!(
        outcome.quadlet_files,
        ["shop--db.container", "shop--main.container", "shop--main.network"]
    );
    assert_eq!(
        read(&fx.unit("main.container")),
        "[Container]\nContainerName=shop--main\nImage=docker.io/library/nginx:1.27\nNetwork=shop--main.network\n"
    );
    assert_eq!(
        read(&fx.unit("main.network")),
        "[Network]\nNetworkName=shop--main\n"
    );
    assert_eq!(
        read(&fx.app_base().join("shop/init/db/schema.sql")),
        "CREATE TABLE t ();\n"
    );
}

#[test]
fn jinja_filters_and_blocks_are_rendered() {
    let fx = Fixture::new("shop");
    fx.write(
        "quadlets/main.container",
        "[Container]\nImage={{ image | default('nginx') }}:{{ tag }}\n{% if debug %}\nEnvironment=DEBUG=1\n{% endif %}\n",
    );
    let mut opts = fx.deploy_opts(DesiredState::Installed, false);
    opts.vars.vars = vec![
        ("image".to_string(), "caddy".to_string()),
        ("tag".to_string(), "2".to_string()),
        ("debug".to_string(), String::new()),
    ];

    execute(
        &opts,
        &fx.settings(),
        &RecordingControl::default(),
        &Logger::default(),
        false,
    )
    .unwrap();
    assert_eq!(
        read(&fx.unit("main.container")),
        "[Container]\nContainerName=shop--main\nImage=caddy:2\n"
    );
}

#[test]
fn undefined_template_variable_fails_before_any_call() {
    let fx = Fixture::new("shop");
    fx.write("quadlets/main.container", "[Container]\nImage={{ image }}\n");
    let control = RecordingControl::default();

    let err = deploy(&fx, &control, DesiredState::Installed, false).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to template file"));
    assert!(control.calls().is_empty());
    assert!(!fx.unit_dir().exists());
}

#[cfg(unix)]
#[test]
fn deployed_files_are_world_readable() {
    use std::os::unix::fs::PermissionsExt as _;
    let fx = Fixture::new("shop");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();
    let mode = std::fs::metadata(fx.unit("main.container"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644);
}

// ---------------------------------------------------------------------------
// Service state transitions
// ---------------------------------------------------------------------------

#[test]
fn started_inactive_unchanged_only_starts() {
    let fx = Fixture::new("shop");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();

    let control = RecordingControl::with_active(false);
    let outcome = deploy(&fx, &control, DesiredState::Started, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.msg, "quadlet files deployed and service started");
    assert_eq!(
        control.calls(),
        ["is-active shop--main.service", "start shop--main.service"]
    );
}

#[test]
fn started_inactive_changed_deploys_then_starts() {
    let fx = Fixture::new("shop");
    let control = RecordingControl::with_active(false);

    let outcome = deploy(&fx, &control, DesiredState::Started, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.msg, "quadlet files deployed and service started");
    assert_eq!(
        control.calls(),
        [
            "is-active shop--main.service",
            "generator -dryrun",
            "daemon-reload",
            "start shop--main.service",
        ]
    );
    assert!(fx.unit("main.container").is_file());
}

#[test]
fn started_active_changed_restarts_dependencies_then_main() {
    let fx = Fixture::new("shop");
    fx.write("quadlets/db.container", "[Container]\nImage=postgres:16\n");
    let control = RecordingControl {
        active: true,
        dependencies: vec!["shop--db.service".to_string()],
        ..RecordingControl::default()
    };

    let outcome = deploy(&fx, &control, DesiredState::Started, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(
        control.calls(),
        [
            "is-active shop--main.service",
            "generator -dryrun",
            "daemon-reload",
            "list-dependencies shop--main.service",
            "restart shop--db.service",
            "restart shop--main.service",
        ]
    );
}

#[test]
fn started_active_unchanged_is_noop() {
    let fx = Fixture::new("shop");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();

    let control = RecordingControl::with_active(true);
    let outcome = deploy(&fx, &control, DesiredState::Started, false).unwrap();
    assert!(!outcome.changed);
    assert_eq!(control.calls(), ["is-active shop--main.service"]);
}

#[test]
fn restarted_without_dependencies_restarts_main_only() {
    let fx = Fixture::new("shop");
    deploy(&fx, &RecordingControl::default(), DesiredState::Installed, false).unwrap();

    let control = RecordingControl::default();
    let outcome = deploy(&fx, &control, DesiredState::Restarted, false).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.msg, "quadlet files deployed and service restarted");
    assert_eq!(
        control.calls(),
        [
            "list-dependencies shop--main.service",
            "restart shop--main.service"
        ]
    );
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn generator_failure_blocks_reload_and_keeps_stderr() {
    let fx = Fixture::new("shop");
    let stderr = "quadlet-generator[1]: shop--main.container: unsupported key 'Imagee' in group 'Container'\n";
    let control = RecordingControl {
        generator_stderr: Some(stderr.to_string()),
        ..RecordingControl::default()
    };

    let err = deploy(&fx, &control, DesiredState::Started, false).unwrap_err();
    assert_eq!(
        control.calls(),
        ["is-active shop--main.service", "generator -dryrun"]
    );
    let report = FailureReport::from_error(&err);
    assert_eq!(report.stderr.as_deref(), Some(stderr));
    assert_eq!(report.rc, Some(1));
    assert!(report.msg.contains("unsupported key 'Imagee'"));
}

#[test]
fn invalid_tree_fails_before_any_call() {
    let fx = Fixture::new("shop");
    fx.write("config.d/cache/redis.conf", "maxmemory 64mb\n");
    let control = RecordingControl::default();

    let err = deploy(&fx, &control, DesiredState::Started, false).unwrap_err();
    assert!(err.to_string().contains("config.d/cache"));
    assert!(control.calls().is_empty());
    assert!(!fx.unit_dir().exists());
}

#[test]
fn dry_run_writes_nothing() {
    let fx = Fixture::new("shop");
    let control = RecordingControl::with_active(false);

    let outcome = execute(
        &fx.deploy_opts(DesiredState::Started, false),
        &fx.settings(),
        &control,
        &Logger::default(),
        true,
    )
    .unwrap();
    assert!(outcome.changed, "dry run reports what would change");
    assert!(!fx.unit_dir().exists());
    assert_eq!(control.calls(), ["is-active shop--main.service"]);
}
