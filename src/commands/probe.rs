use anyhow::{bail, Context, Result};
use colored::Colorize;
use reqwest::Url;
use std::time::Duration;

use super::print::print_probe;
use crate::probe::{ProbePolicy, Prober};

/// Probe a URL until it answers below 500 or attempts run out
/// Usage: infracheck probe <url> [--attempts n] [--interval secs]
pub fn execute(url: &str, attempts: u32, interval_secs: u64) -> Result<()> {
    let url = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    let policy = ProbePolicy::new(attempts, Duration::from_secs(interval_secs))?;
    let prober = Prober::http().context("Failed to create HTTP client")?;

    println!(
        "{} Probing {} (up to {} attempts, {:?} apart)",
        "→".blue(),
        url.as_str().cyan(),
        policy.max_attempts(),
        policy.interval()
    );

    let result = prober.probe(&url, &policy);
    print_probe(&result);

    if !result.succeeded {
        bail!(
            "Failed to access {url} after {} attempts",
            result.attempts
        );
    }

    println!("{} {} is accessible", "✓".green().bold(), url);
    if result.secure_transport != Some(true) {
        println!("{} Response was not served over HTTPS", "⚠".yellow());
    }
    Ok(())
}
