//! End-to-end tests for the `sheetwatch` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

fn sheetwatch(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheetwatch"))
        .current_dir(dir)
        .env_remove("SHEETWATCH_TEST_UNSET_HOOK")
        .args(args)
        .output()
        .expect("failed to run sheetwatch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_sheet(dir: &Path, name: &str, level: u64, hp_max: u64) -> PathBuf {
    let path = dir.join(name);
    let sheet = json!({
        "character_info": {"name": "Vex", "level": level},
        "combat": {"hit_points": {"maximum": hp_max, "current": 20}}
    });
    fs::write(&path, serde_json::to_vec_pretty(&sheet).unwrap()).unwrap();
    path
}

fn level_up_pair(dir: &Path) -> (String, String) {
    let old = write_sheet(dir, "old.json", 4, 32);
    let new = write_sheet(dir, "new.json", 5, 38);
    (
        old.to_string_lossy().into_owned(),
        new.to_string_lossy().into_owned(),
    )
}

// ----------------------------------------------------------------------------
// diff
// ----------------------------------------------------------------------------

#[test]
fn test_diff_json_lists_level_up_with_causation() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(dir.path(), &["diff", "--old", &old, "--new", &new, "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let records = records.as_array().unwrap();
    let paths: Vec<&str> = records
        .iter()
        .map(|r| r["field_path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"character_info.level"));
    assert!(paths.contains(&"combat.hit_points.maximum"));

    let hp = records
        .iter()
        .find(|r| r["field_path"] == "combat.hit_points.maximum")
        .unwrap();
    assert_eq!(hp["causation"]["trigger"], "level_up");
}

#[test]
fn test_diff_no_causation_flag_drops_links() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(
        dir.path(),
        &["diff", "--old", &old, "--new", &new, "--json", "--no-causation"],
    );
    assert!(output.status.success());
    let records: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(records
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r.get("causation").is_none()));
}

#[test]
fn test_diff_preset_can_filter_everything_out() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(
        dir.path(),
        &["diff", "--old", &old, "--new", &new, "--preset", "roleplay_session"],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "No changes.");
}

#[test]
fn test_diff_text_output_shows_priority_and_cause() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(dir.path(), &["diff", "--old", &old, "--new", &new]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("character_info.level"));
    assert!(text.contains("caused by level_up"));
    assert!(text.contains("2 change(s)"));
}

#[test]
fn test_diff_markdown_has_character_heading() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(
        dir.path(),
        &["diff", "--old", &old, "--new", &new, "--markdown"],
    );
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("## Changes for Vex"));
}

#[test]
fn test_diff_rejects_preset_with_include() {
    let dir = TempDir::new().unwrap();
    let (old, new) = level_up_pair(dir.path());

    let output = sheetwatch(
        dir.path(),
        &["diff", "--old", &old, "--new", &new, "--preset", "minimal", "--include", "combat"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_diff_malformed_snapshot_fails() {
    let dir = TempDir::new().unwrap();
    let (old, _) = level_up_pair(dir.path());
    let bad = dir.path().join("bad.json");
    fs::write(&bad, b"{ not json").unwrap();

    let output = sheetwatch(
        dir.path(),
        &["diff", "--old", &old, "--new", bad.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("MALFORMED_SNAPSHOT"));
}

// ----------------------------------------------------------------------------
// groups / presets
// ----------------------------------------------------------------------------

#[test]
fn test_groups_lists_core_and_composite() {
    let dir = TempDir::new().unwrap();
    let output = sheetwatch(dir.path(), &["groups"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Core groups:"));
    assert!(text.contains("combat"));
    assert!(text.contains("Composite groups:"));
}

#[test]
fn test_groups_resolve_prints_patterns() {
    let dir = TempDir::new().unwrap();
    let output = sheetwatch(dir.path(), &["groups", "--resolve", "combat"]);
    assert!(output.status.success());
    assert!(stdout(&output).lines().any(|l| l.starts_with("combat.")));
}

#[test]
fn test_presets_lists_builtin_presets() {
    let dir = TempDir::new().unwrap();
    let output = sheetwatch(dir.path(), &["presets"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for name in ["full", "minimal", "combat_only", "roleplay_session", "quiet"] {
        assert!(text.contains(name), "missing preset {}", name);
    }
}

// ----------------------------------------------------------------------------
// validate-webhook
// ----------------------------------------------------------------------------

#[test]
fn test_validate_malformed_url_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = sheetwatch(
        dir.path(),
        &["validate-webhook", "https://example.com/not-a-webhook"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("VALIDATION_ERROR"));
}

#[test]
fn test_validate_unresolved_placeholder_is_accepted() {
    let dir = TempDir::new().unwrap();
    let output = sheetwatch(
        dir.path(),
        &["validate-webhook", "${SHEETWATCH_TEST_UNSET_HOOK}", "--json"],
    );
    assert!(output.status.success());
    let result: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["is_valid"], true);
}

// ----------------------------------------------------------------------------
// run
// ----------------------------------------------------------------------------

#[test]
fn test_run_stores_baseline_then_reports_no_changes() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_sheet(dir.path(), "sheet.json", 4, 32);
    let store_dir = dir.path().join("snapshots");
    let config = dir.path().join("sheetwatch.toml");
    fs::write(
        &config,
        format!(
            "character_id = \"vex\"\nsnapshot_dir = {:?}\n",
            store_dir.to_string_lossy()
        ),
    )
    .unwrap();
    let args = [
        "run",
        "--config",
        config.to_str().unwrap(),
        "--snapshot",
        snapshot.to_str().unwrap(),
    ];

    let first = sheetwatch(dir.path(), &args);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    assert!(stdout(&first).contains("baseline snapshot stored"));
    assert!(store_dir.join("vex").join("latest.json").exists());

    let second = sheetwatch(dir.path(), &args);
    assert!(second.status.success());
    let text = stdout(&second);
    assert!(text.contains("no changes"));
    assert!(text.contains("\"monitor_cycle\""));
}

#[test]
fn test_run_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_sheet(dir.path(), "sheet.json", 4, 32);
    let output = sheetwatch(
        dir.path(),
        &[
            "run",
            "--config",
            "missing.toml",
            "--snapshot",
            snapshot.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("CONFIG_ERROR"));
}
