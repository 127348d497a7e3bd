//! Result types for assertions

use serde::Serialize;

/// Outcome of a single named assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn passed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
        }
    }

    /// Pass or fail depending on `ok`, with the message matching the outcome.
    pub fn check(
        name: impl Into<String>,
        ok: bool,
        pass_message: impl Into<String>,
        fail_message: impl Into<String>,
    ) -> Self {
        if ok {
            Self::passed(name, pass_message)
        } else {
            Self::failed(name, fail_message)
        }
    }

    pub fn summary(&self) -> String {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        format!("{status} - {}: {}", self.name, self.message)
    }
}

/// All assertions of a case, in the order they ran. A failed check does not
/// stop the ones after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: CheckOutcome) {
        if !outcome.passed {
            tracing::warn!("{}", outcome.summary());
        }
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, other: CheckReport) {
        for outcome in other.outcomes {
            self.push(outcome);
        }
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
