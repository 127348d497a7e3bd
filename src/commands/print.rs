//! Human-readable report output

use colored::Colorize;

use crate::checks::CheckReport;
use crate::probe::ProbeResult;
use crate::suite::{CaseReport, SuiteReport};

pub fn print_suite_report(report: &SuiteReport) {
    for case in &report.cases {
        print_case_report(case);
    }

    let failed = report.failed_cases();
    println!("{}", "-".repeat(60).dimmed());
    if failed.is_empty() {
        println!(
            "{} {} case(s) passed {}",
            "✓".green().bold(),
            report.cases.len(),
            format!("(run {})", report.run_id).dimmed()
        );
    } else {
        println!(
            "{} {} of {} case(s) failed {}",
            "✗".red().bold(),
            failed.len(),
            report.cases.len(),
            format!("(run {})", report.run_id).dimmed()
        );
    }
}

pub fn print_case_report(case: &CaseReport) {
    let status = if case.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    let duration = case
        .duration_secs()
        .map(|s| format!("({s}s)"))
        .unwrap_or_default();
    println!("\n{} {} {}", status, case.name.bold(), duration.dimmed());

    if let Some(summary) = &case.plan_summary {
        println!("  {} Plan: {}", "ℹ".blue(), summary);
    }
    print_checks(&case.checks);
    if let Some(probe) = &case.probe {
        print_probe(probe);
    }
    if let Some(error) = &case.error {
        println!("  {} {}", "error:".red().bold(), error);
    }
}

fn print_checks(checks: &CheckReport) {
    for outcome in checks.outcomes() {
        if outcome.passed {
            println!("  {} {}", "✓".green(), outcome.message);
        } else {
            println!("  {} {}", "✗".red(), outcome.message.red());
        }
    }
}

pub fn print_probe(result: &ProbeResult) {
    let status = result
        .last_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no response".to_string());
    println!(
        "  {} {} attempt(s), last status: {}",
        "→".blue(),
        result.attempts,
        status
    );
}
