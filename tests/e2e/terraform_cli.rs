//! The Terraform-backed provisioner driven against a fake `terraform` script

use infracheck::terraform::{ToolOptions, TOOL_ENV_VAR};
use infracheck::{Error, ModuleConfig, Provisioner, Terraform};
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

use super::helpers::{create_module_dir, FakeTool, GOOD_HOSTNAME, GOOD_PRINCIPAL, GOOD_URL};

fn web_app_tool() -> FakeTool {
    FakeTool::new().with_outputs(&[
        ("web_app_url", GOOD_URL),
        ("web_app_hostname", GOOD_HOSTNAME),
        ("managed_identity_principal_id", GOOD_PRINCIPAL),
    ])
}

#[test]
fn test_init_and_apply_returns_outputs() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path()).with_var("environment", "test");
    let terraform = Terraform::new(tool.path());

    let outputs = terraform.init_and_apply(&module).unwrap();

    assert_eq!(outputs.get("web_app_url"), Some(GOOD_URL));
    assert_eq!(outputs.require("web_app_hostname").unwrap(), GOOD_HOSTNAME);
    assert_eq!(outputs.len(), 3);

    let apply = tool.calls_of("apply");
    assert_eq!(apply.len(), 1);
    assert!(apply[0].contains("-auto-approve"));
    assert!(apply[0].contains("-no-color"));
    assert!(apply[0].ends_with("-var environment=test"));
    assert_eq!(tool.calls_of("init").len(), 1);
}

#[test]
fn test_commands_run_in_module_directory() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path());
    Terraform::new(tool.path()).init(&module).unwrap();

    let call = tool.calls().pop().unwrap();
    let (cwd, _) = call.split_once('|').unwrap();
    assert_eq!(
        PathBuf::from(cwd).canonicalize().unwrap(),
        module_dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_plan_returns_plan_text() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path()).with_var("environment", "plan-test");

    let plan = Terraform::new(tool.path()).plan(&module).unwrap();

    assert!(plan.contains("azurerm_service_plan.this"));
    assert!(plan.contains("Plan: 3 to add"));
    assert!(tool.calls_of("plan")[0].contains("environment=plan-test"));
}

#[test]
fn test_single_output() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path());

    let value = Terraform::new(tool.path())
        .output(&module, "managed_identity_principal_id")
        .unwrap();
    assert_eq!(value, GOOD_PRINCIPAL);
}

#[test]
fn test_undeclared_output_is_missing_output() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path());

    let err = Terraform::new(tool.path())
        .output(&module, "nope")
        .unwrap_err();
    assert!(matches!(err, Error::MissingOutput { ref name } if name == "nope"));
}

#[test]
fn test_failed_apply_is_tool_invocation_error() {
    let tool = web_app_tool().failing("apply");
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path());

    let err = Terraform::new(tool.path()).apply(&module).unwrap_err();

    match err {
        Error::ToolInvocation {
            command,
            exit_code,
            stderr,
        } => {
            assert!(command.contains("apply"));
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("apply failed"));
            assert!(stderr.contains("TF_IN_AUTOMATION=1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Outputs are never read after a failed apply
    assert!(tool.calls_of("output").is_empty());
}

#[test]
fn test_destroy_carries_vars() {
    let tool = web_app_tool();
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path()).with_var("environment", "test");

    Terraform::new(tool.path()).destroy(&module).unwrap();

    let destroy = tool.calls_of("destroy");
    assert_eq!(destroy.len(), 1);
    assert!(destroy[0].contains("-auto-approve"));
    assert!(destroy[0].contains("environment=test"));
}

#[test]
fn test_version() {
    let tool = FakeTool::new();
    let version = Terraform::new(tool.path()).version().unwrap();
    assert_eq!(version, semver::Version::new(1, 7, 5));
}

#[test]
fn test_missing_binary_is_tool_failure() {
    let module_dir = create_module_dir();
    let module = ModuleConfig::new(module_dir.path());
    let err = Terraform::new("/nonexistent/terraform")
        .init(&module)
        .unwrap_err();
    assert!(err.is_tool_failure());
}

#[test]
#[serial]
fn test_locate_prefers_env_var_over_path() {
    let tool = FakeTool::new();
    std::env::set_var(TOOL_ENV_VAR, tool.path());

    let located = Terraform::locate(&ToolOptions::default());
    std::env::remove_var(TOOL_ENV_VAR);

    assert_eq!(located.unwrap().binary(), tool.path());
}

#[test]
#[serial]
fn test_locate_explicit_binary_beats_env_var() {
    std::env::set_var(TOOL_ENV_VAR, "/from/env/terraform");
    let options = ToolOptions {
        binary: Some(PathBuf::from("/from/config/tofu")),
        command_timeout: Duration::from_secs(30),
    };

    let located = Terraform::locate(&options);
    std::env::remove_var(TOOL_ENV_VAR);

    let terraform = located.unwrap();
    assert_eq!(terraform.binary(), PathBuf::from("/from/config/tofu"));
    assert_eq!(terraform.command_timeout(), Duration::from_secs(30));
}
