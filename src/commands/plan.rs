use anyhow::{bail, Context, Result};

use super::print::print_case_report;
use super::ModuleArgs;
use crate::suite::run_plan_case;
use crate::terraform::Terraform;

/// Init and plan one module, then check for the expected resources
/// Usage: infracheck plan <dir> [--var k=v]... [--expect <address>]...
pub fn execute(args: ModuleArgs, expect: Vec<String>) -> Result<()> {
    let mut config = args.suite_config()?;
    if !expect.is_empty() {
        config.cases.plan.expect_resources = expect;
    }

    let terraform =
        Terraform::locate(&config.tool_options()).context("Failed to locate provisioning tool")?;

    let report = run_plan_case(&terraform, &config);
    print_case_report(&report);

    if report.passed() {
        Ok(())
    } else {
        bail!("Plan case failed")
    }
}
