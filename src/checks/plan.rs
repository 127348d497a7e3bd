//! Assertions on rendered plan text

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::result::{CheckOutcome, CheckReport};

/// Resources the web app module's plan must mention.
pub const DEFAULT_PLAN_RESOURCES: &[&str] = &[
    "azurerm_resource_group.example",
    "azurerm_service_plan.this",
    "azurerm_linux_web_app.this",
];

/// Plain substring presence; the plan is not parsed for this.
pub fn check_plan_resources<S: AsRef<str>>(plan_text: &str, expected: &[S]) -> CheckReport {
    let mut report = CheckReport::new();
    for resource in expected {
        let resource = resource.as_ref();
        report.push(CheckOutcome::check(
            format!("plan includes {resource}"),
            plan_text.contains(resource),
            format!("plan includes {resource}"),
            format!("plan should include {resource}"),
        ));
    }
    report
}

/// Counts from the `Plan: X to add, Y to change, Z to destroy.` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanSummary {
    pub add: u32,
    pub change: u32,
    pub destroy: u32,
}

fn summary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Plan: (\d+) to add, (\d+) to change, (\d+) to destroy")
            .expect("plan summary regex is valid")
    })
}

impl PlanSummary {
    /// `None` when the text has neither a summary line nor "No changes."
    pub fn parse(plan_text: &str) -> Option<Self> {
        if let Some(caps) = summary_regex().captures(plan_text) {
            let count = |i: usize| caps[i].parse::<u32>().ok();
            return Some(Self {
                add: count(1)?,
                change: count(2)?,
                destroy: count(3)?,
            });
        }
        if plan_text.contains("No changes.") {
            return Some(Self::default());
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.change == 0 && self.destroy == 0
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.add, self.change, self.destroy
        )
    }
}
