//! CLI integration tests for data-spreader.
//!
//! These tests verify command-line argument parsing, help output, exit
//! codes for the error classes, and full spread runs over sqlite tiers.

use assert_cmd::Command;
use data_spreader::core::{FieldDef, FieldType, FieldValue, TableSchema};
use data_spreader::store::{DatasetStore, SqliteStore};
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

/// Get a command for the data-spreader binary.
fn cmd() -> Command {
    Command::cargo_bin("data-spreader").unwrap()
}

/// Write a three-tier sqlite config into `dir` and seed the source tier
/// with a couple of trail rows.
fn seeded_workspace(dir: &Path) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let yaml = format!(
        r#"
tiers:
  source:
    kind: sqlite
    path: {dir}/source.sqlite
  internal:
    kind: sqlite
    path: {dir}/internal.sqlite
  public:
    kind: sqlite
    path: {dir}/public.sqlite
datasets:
  - name: trails
    table: trails
    table_overrides:
      source: TRAILS_EXPORT
    fields:
      - {{ from: NAME, to: name, type: text }}
      - {{ from: MILES, to: length_miles, type: real }}
pipelines:
  - name: nightly
    route: [source, internal, public]
    datasets: [trails]
log_dir: {dir}/logs
report:
  out_dir: {dir}/reports
"#,
        dir = dir.display()
    );
    std::fs::write(&config_path, yaml).unwrap();

    let source = SqliteStore::open(dir.join("source.sqlite")).unwrap();
    source
        .ensure_table(&TableSchema::new(
            "TRAILS_EXPORT",
            vec![
                FieldDef::new("NAME", FieldType::Text),
                FieldDef::new("MILES", FieldType::Real),
            ],
        ))
        .unwrap();
    source
        .append(
            "TRAILS_EXPORT",
            &["NAME".to_string(), "MILES".to_string()],
            &[
                vec![FieldValue::from("Ridge Loop"), FieldValue::from(3.2)],
                vec![FieldValue::from("River Walk"), FieldValue::from(1.5)],
            ],
        )
        .unwrap();

    config_path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("spread"))
        .stdout(predicate::str::contains("replicate"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("clone-item"))
        .stdout(predicate::str::contains("item-dependencies"))
        .stdout(predicate::str::contains("restart-services"))
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_spread_subcommand_help() {
    cmd()
        .args(["spread", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--pipeline"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_report_subcommand_help() {
    cmd()
        .args(["report", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("users"))
        .stdout(predicate::str::contains("groups"))
        .stdout(predicate::str::contains("items"))
        .stdout(predicate::str::contains("relationship-classes"))
        .stdout(predicate::str::contains("domains"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("data-spreader"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_unknown_tier_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["replicate", "--dataset", "trails", "--from", "source", "--to", "nowhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown tier 'nowhere'"));
}

#[test]
fn test_replicate_from_unloaded_tier_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    // Nothing has been spread yet, so internal holds no trails table. That
    // is a configuration problem (code 1), not a copy failure (code 3).
    cmd()
        .args(["--config", config.to_str().unwrap()])
        .args(["replicate", "--dataset", "trails", "--from", "internal", "--to", "public"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist on tier 'internal'"));
}

#[test]
fn test_failed_spread_exits_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    // Pre-create the public table under an incompatible schema so the
    // internal -> public hop fails mapping validation.
    let public = SqliteStore::open(dir.path().join("public.sqlite")).unwrap();
    public
        .ensure_table(&TableSchema::new(
            "trails",
            vec![FieldDef::new("label", FieldType::Text)],
        ))
        .unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Failed: nightly/trails"));
}

// =============================================================================
// End-to-End Spread Tests
// =============================================================================

#[test]
fn test_spread_copies_through_route() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Datasets: 1/1 succeeded"))
        .stdout(predicate::str::contains("Rows copied: 4"));

    let public = SqliteStore::open(dir.path().join("public.sqlite")).unwrap();
    assert_eq!(public.row_count("trails").unwrap(), 2);
    let schema = public.table_schema("trails").unwrap();
    assert_eq!(schema.field_names(), vec!["name", "length_miles"]);
}

#[test]
fn test_spread_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success();
    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success();

    let public = SqliteStore::open(dir.path().join("public.sqlite")).unwrap();
    assert_eq!(public.row_count("trails").unwrap(), 2);
}

#[test]
fn test_spread_output_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "--output-json", "spread"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"completed\""))
        .stdout(predicate::str::contains("\"rows_copied\": 4"));
}

#[test]
fn test_dry_run_leaves_stores_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread", "--dry-run"])
        .assert()
        .success();

    let internal = SqliteStore::open(dir.path().join("internal.sqlite")).unwrap();
    assert!(!internal.table_exists("trails").unwrap());
}

#[test]
fn test_validate_after_spread() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success();
    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation passed: 2 checks"));
}

#[test]
fn test_validate_mismatch_exits_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success();

    // Tamper with a middle tier behind the pipeline's back.
    let internal = SqliteStore::open(dir.path().join("internal.sqlite")).unwrap();
    internal.truncate("trails").unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("MISMATCH"));
}

#[test]
fn test_health_check_reports_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tier source: OK"))
        .stdout(predicate::str::contains("portal: not configured"));
}

// =============================================================================
// Log File Tests
// =============================================================================

#[test]
fn test_log_file_is_truncated_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    for _ in 0..2 {
        cmd()
            .args(["--config", config.to_str().unwrap(), "health-check"])
            .assert()
            .success();
    }

    let log = std::fs::read_to_string(dir.path().join("logs/health_check.log")).unwrap();
    // Two runs, but the file only ever holds the latest one.
    assert_eq!(log.matches("Loaded configuration").count(), 1);
}

#[test]
fn test_commands_log_to_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_workspace(dir.path());

    cmd()
        .args(["--config", config.to_str().unwrap(), "spread"])
        .assert()
        .success();
    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success();

    assert!(dir.path().join("logs/spread.log").exists());
    assert!(dir.path().join("logs/validate.log").exists());
    let spread_log = std::fs::read_to_string(dir.path().join("logs/spread.log")).unwrap();
    assert!(spread_log.contains("Starting spread run"));
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
