use anyhow::{bail, Context, Result};
use colored::Colorize;

use super::print::print_case_report;
use super::ModuleArgs;
use crate::probe::Prober;
use crate::suite::run_basic_case;
use crate::terraform::Terraform;

/// Apply one module, check its outputs, probe it and destroy it
/// Usage: infracheck apply <dir> [--var k=v]... [--attempts n] [--interval secs]
pub fn execute(args: ModuleArgs, attempts: Option<u32>, interval: Option<u64>) -> Result<()> {
    let mut config = args.suite_config()?;
    if let Some(attempts) = attempts {
        config.probe.max_attempts = attempts;
    }
    if let Some(interval) = interval {
        config.probe.interval_secs = interval;
    }
    let policy = config.probe_policy().context("Invalid probe settings")?;

    let terraform =
        Terraform::locate(&config.tool_options()).context("Failed to locate provisioning tool")?;
    let prober = Prober::http().context("Failed to create HTTP client")?;

    println!(
        "{} Applying {} (probe: {} x {:?}, destroy runs afterwards)",
        "→".blue(),
        config.module_directory().display().to_string().cyan(),
        policy.max_attempts(),
        policy.interval()
    );

    let report = run_basic_case(&terraform, &prober, &config);
    print_case_report(&report);

    if report.passed() {
        Ok(())
    } else {
        bail!("Apply case failed")
    }
}
