//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home
//! directory, so the real configuration is never touched.

mod common;

use common::{assert_contains, run_cli, run_cli_failure, run_cli_success};
use tempfile::TempDir;

fn home() -> TempDir {
    tempfile::tempdir().expect("create temp home")
}

#[test]
fn test_config_defaults() {
    let home = home();
    let out = run_cli_success(home.path(), &["config", "get", "schedule.turn_on_time"]);
    assert_eq!(out.trim(), "22:00");
    let out = run_cli_success(home.path(), &["config", "get", "schedule.time_toggle"]);
    assert_eq!(out.trim(), "false");
}

#[test]
fn test_config_set_persists() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "schedule.turn_off_time", "07:30"]);
    let out = run_cli_success(home.path(), &["config", "get", "schedule.turn_off_time"]);
    assert_eq!(out.trim(), "07:30");

    let path = run_cli_success(home.path(), &["config", "path"]);
    let content = std::fs::read_to_string(path.trim()).unwrap();
    assert_contains(&content, "07:30");
}

#[test]
fn test_config_set_rejects_bad_time() {
    let home = home();
    let (_, stderr, _) =
        run_cli_failure(home.path(), &["config", "set", "schedule.turn_on_time", "25:00"]);
    assert_contains(&stderr, "error:");
    let out = run_cli_success(home.path(), &["config", "get", "schedule.turn_on_time"]);
    assert_eq!(out.trim(), "22:00");
}

#[test]
fn test_config_get_unknown_key() {
    let home = home();
    let (_, stderr, _) = run_cli_failure(home.path(), &["config", "get", "schedule.nope"]);
    assert_contains(&stderr, "unknown key");
}

#[test]
fn test_config_list_and_reset() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "monitor.poll_interval_ms", "250"]);
    let out = run_cli_success(home.path(), &["config", "list"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["monitor"]["poll_interval_ms"], 250);
    assert_eq!(json["schedule"]["turn_on_time"], "22:00");

    run_cli_success(home.path(), &["config", "reset"]);
    let out = run_cli_success(home.path(), &["config", "get", "monitor.poll_interval_ms"]);
    assert_eq!(out.trim(), "1000");
}

#[test]
fn test_schedule_next_disabled() {
    let home = home();
    let out = run_cli_success(home.path(), &["schedule", "next"]);
    assert_eq!(out.matches("disabled").count(), 2);
}

#[test]
fn test_schedule_next_json_when_enabled() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "schedule.time_toggle", "true"]);
    let out = run_cli_success(home.path(), &["schedule", "next", "on", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["direction"], "on");
    assert_eq!(rows[0]["enabled"], true);
    assert!(rows[0]["next"].is_string());
}

#[test]
fn test_schedule_next_rejects_bad_direction() {
    let home = home();
    let (_, _, code) = run_cli(home.path(), &["schedule", "next", "sideways"]);
    assert_ne!(code, 0);
}

#[test]
fn test_monitor_classify() {
    let home = home();
    let out = run_cli_success(
        home.path(),
        &[
            "monitor",
            "classify",
            "com.android.packageinstaller",
            "com.jmstudios.redmoon",
            "org.mozilla.firefox",
        ],
    );
    assert_contains(&out, "com.android.packageinstaller: SuspendTriggering (suspend)");
    assert_contains(&out, "com.jmstudios.redmoon: OwnApp (none)");
    assert_contains(&out, "org.mozilla.firefox: Other (resume)");
}

#[test]
fn test_monitor_classify_uses_configured_extras() {
    let home = home();
    run_cli_success(
        home.path(),
        &["config", "set", "monitor.extra_suspend_apps", "org.example.bank"],
    );
    let out = run_cli_success(
        home.path(),
        &["monitor", "classify", "org.example.bank", "--json"],
    );
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json[0]["class"], "suspend_triggering");
    assert_eq!(json[0]["command"], "suspend");
}

#[test]
fn test_monitor_simulate() {
    let home = home();
    let out = run_cli_success(
        home.path(),
        &[
            "monitor",
            "simulate",
            "com.android.packageinstaller",
            "com.jmstudios.redmoon",
            "org.mozilla.firefox",
            "--interval-ms",
            "5",
        ],
    );
    assert_eq!(
        out,
        "com.android.packageinstaller\n  -> suspend\n\
         com.jmstudios.redmoon\n\
         org.mozilla.firefox\n  -> resume\n"
    );
}

#[test]
fn test_run_disabled_exits_after_deadline() {
    let home = home();
    let out = run_cli_success(home.path(), &["run", "--for-secs", "1"]);
    assert_eq!(out.matches("disabled").count(), 2);
}

#[test]
fn test_run_picks_tier_from_level() {
    let home = home();
    run_cli_success(home.path(), &["config", "set", "schedule.time_toggle", "true"]);

    let out = run_cli_success(home.path(), &["run", "--for-secs", "1"]);
    assert_eq!(out.matches("ExactAllowWhileIdle").count(), 2);

    let out = run_cli_success(home.path(), &["run", "--for-secs", "1", "--level", "19"]);
    assert_eq!(out.matches("(Exact)").count(), 2);

    let out = run_cli_success(home.path(), &["run", "--for-secs", "1", "--level", "18"]);
    assert_eq!(out.matches("Inexact").count(), 2);
}
