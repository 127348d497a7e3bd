use anyhow::{bail, Context, Result};
use std::path::Path;

use super::print::print_suite_report;
use crate::config::SuiteConfig;
use crate::probe::Prober;
use crate::suite::{run_suite, CaseKind};
use crate::terraform::Terraform;

/// Run the suite
/// Usage: infracheck run [--config <file>] [--case basic|plan]... [--json]
pub fn execute(config_path: Option<&Path>, cases: Vec<CaseKind>, json: bool) -> Result<()> {
    let config = SuiteConfig::discover(config_path).context("Failed to load configuration")?;
    config
        .probe_policy()
        .context("Invalid [probe] configuration")?;

    let terraform =
        Terraform::locate(&config.tool_options()).context("Failed to locate provisioning tool")?;
    let prober = Prober::http().context("Failed to create HTTP client")?;

    let cases = if cases.is_empty() {
        CaseKind::ALL.to_vec()
    } else {
        dedup(cases)
    };

    let report = run_suite(&terraform, &prober, &config, &cases);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_suite_report(&report);
    }

    if report.passed() {
        Ok(())
    } else {
        bail!("{} case(s) failed", report.failed_cases().len())
    }
}

fn dedup(cases: Vec<CaseKind>) -> Vec<CaseKind> {
    let mut seen = Vec::new();
    for case in cases {
        if !seen.contains(&case) {
            seen.push(case);
        }
    }
    seen
}
