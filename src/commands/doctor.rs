use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::SuiteConfig;
use crate::terraform::Terraform;

/// Show which tool binary would be used, its version, and the resolved config
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = SuiteConfig::discover(config_path).context("Failed to load configuration")?;

    let terraform =
        Terraform::locate(&config.tool_options()).context("Failed to locate provisioning tool")?;
    let version = terraform
        .version()
        .context("Failed to query tool version")?;

    println!("{}", "Provisioning tool".bold().underline());
    println!("  {} {}", "Binary:".bold(), terraform.binary().display());
    println!("  {} {}", "Version:".bold(), version.to_string().cyan());
    println!(
        "  {} {}s",
        "Command timeout:".bold(),
        terraform.command_timeout().as_secs()
    );

    let module = config.module_directory();
    println!("\n{}", "Module".bold().underline());
    println!("  {} {}", "Directory:".bold(), module.display());
    match config.basic_module().validate() {
        Ok(()) => println!("  {} module looks valid", "✓".green()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }
    println!(
        "  {} {}",
        "Isolated copies:".bold(),
        if config.module.isolate { "yes" } else { "no" }
    );

    let policy = config.probe_policy()?;
    println!("\n{}", "Probe".bold().underline());
    println!(
        "  {} {} x {}s (worst case {}s of waiting)",
        "Policy:".bold(),
        policy.max_attempts(),
        policy.interval().as_secs(),
        policy.worst_case_wait().as_secs()
    );

    Ok(())
}
