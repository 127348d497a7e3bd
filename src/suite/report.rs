//! Per-case and per-run reports

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::checks::{CheckReport, PlanSummary};
use crate::probe::ProbeResult;

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub checks: CheckReport,
    pub probe: Option<ProbeResult>,
    pub plan_summary: Option<PlanSummary>,
    /// Fatal error that ended the case early (tool failure, bad config)
    pub error: Option<String>,
}

impl CaseReport {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            finished_at: None,
            checks: CheckReport::new(),
            probe: None,
            plan_summary: None,
            error: None,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.checks.all_passed()
    }

    pub fn duration_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|end| end.signed_duration_since(self.started_at).num_seconds())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: String,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    pub fn failed_cases(&self) -> Vec<&CaseReport> {
        self.cases.iter().filter(|c| !c.passed()).collect()
    }
}
