//! Suites driven from an `infracheck.toml`

use infracheck::suite::{run_plan_case, run_suite};
use infracheck::{CaseKind, Prober, SuiteConfig};
use std::fs;
use tempfile::TempDir;

use super::helpers::{good_outputs, FixedStatus, NoSleep, RecordingProvisioner};

/// Repository layout where the example module sources its parent by a
/// relative path.
fn repo_with_config(config: &str) -> TempDir {
    let repo = TempDir::new().expect("Failed to create temp directory");
    let root = repo.path();
    fs::create_dir_all(root.join("examples/basic")).unwrap();
    fs::write(root.join("main.tf"), "resource \"azurerm_linux_web_app\" \"this\" {}\n").unwrap();
    fs::write(
        root.join("examples/basic/main.tf"),
        "module \"web_app\" { source = \"../../\" }\n",
    )
    .unwrap();
    fs::write(root.join("infracheck.toml"), config).unwrap();
    repo
}

#[test]
fn test_root_copies_parent_module_into_workspace() {
    let repo = repo_with_config(
        r#"
[module]
root = "."
directory = "examples/basic"

[probe]
max_attempts = 2
interval_secs = 0
"#,
    );
    let config = SuiteConfig::load(&repo.path().join("infracheck.toml")).unwrap();
    let tool = RecordingProvisioner::new(good_outputs());

    let report = run_plan_case(&tool, &config);
    assert!(report.passed(), "{report:?}");

    let planned_in = &tool.dirs("plan")[0];
    assert!(planned_in.ends_with("examples/basic"));
    assert!(!planned_in.starts_with(repo.path()));
    // The copy is gone once the case finishes
    assert!(!planned_in.exists());
}

#[test]
fn test_expected_resources_from_file() {
    let repo = repo_with_config(
        r#"
[module]
directory = "examples/basic"

[cases.plan]
expect_resources = ["azurerm_key_vault.this"]
"#,
    );
    let config = SuiteConfig::load(&repo.path().join("infracheck.toml")).unwrap();
    let tool = RecordingProvisioner::new(good_outputs());

    let report = run_plan_case(&tool, &config);

    assert!(!report.passed());
    assert_eq!(report.checks.outcomes().len(), 1);
    assert_eq!(
        report.checks.outcomes()[0].name,
        "plan includes azurerm_key_vault.this"
    );
}

#[test]
fn test_probe_budget_from_file() {
    let repo = repo_with_config(
        r#"
[module]
directory = "examples/basic"
isolate = false

[probe]
max_attempts = 4
interval_secs = 0
"#,
    );
    let config = SuiteConfig::load(&repo.path().join("infracheck.toml")).unwrap();
    let tool = RecordingProvisioner::new(good_outputs());
    let prober = Prober::new(FixedStatus(500), NoSleep::default());

    let report = run_suite(&tool, &prober, &config, &[CaseKind::Basic]);

    let probe = report.cases[0].probe.unwrap();
    assert_eq!(probe.attempts, 4);
    assert!(!probe.succeeded);
    assert_eq!(
        tool.dirs("apply"),
        vec![repo.path().join("examples/basic")]
    );
}

#[test]
fn test_discover_with_explicit_path() {
    let repo = repo_with_config("[tool]\ncommand_timeout_secs = 120\n");
    let config = SuiteConfig::discover(Some(&repo.path().join("infracheck.toml"))).unwrap();
    assert_eq!(config.tool_options().command_timeout.as_secs(), 120);
}

#[test]
fn test_unknown_key_in_file_is_an_error() {
    let repo = repo_with_config("[probe]\nretries = 3\n");
    let err = SuiteConfig::load(&repo.path().join("infracheck.toml")).unwrap_err();
    assert!(err.to_string().contains("infracheck.toml"));
}
