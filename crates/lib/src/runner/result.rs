use serde::Serialize;
use std::{fmt, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.step, self.expected, self.actual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SettlementTimeout,
    UnexpectedRejection,
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SettlementTimeout => "settlement timeout",
            ErrorKind::UnexpectedRejection => "unexpected rejection",
            ErrorKind::Infrastructure => "infrastructure error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioStatus {
    Passed,
    Failed(Vec<StepFailure>),
    Errored { kind: ErrorKind, message: String },
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub status: ScenarioStatus,
    pub elapsed: Duration,
}

impl ScenarioOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ScenarioStatus::Failed(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, ScenarioStatus::Errored { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ScenarioStatus::Skipped(_))
    }
}

/// Aggregate counters over a suite run.
///
/// A skipped scenario counts in `run` and `skipped` only, so
/// `success = run - errors - failures` includes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteResult {
    pub run: usize,
    pub errors: usize,
    pub failures: usize,
    pub skipped: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteResult {
    pub fn from_outcomes(outcomes: Vec<ScenarioOutcome>) -> Self {
        Self {
            run: outcomes.len(),
            errors: outcomes.iter().filter(|o| o.is_error()).count(),
            failures: outcomes.iter().filter(|o| o.is_failure()).count(),
            skipped: outcomes.iter().filter(|o| o.is_skipped()).count(),
            outcomes,
        }
    }

    pub fn success(&self) -> usize {
        self.run.saturating_sub(self.errors + self.failures)
    }

    pub fn is_successful(&self) -> bool {
        self.errors == 0 && self.failures == 0
    }

    pub fn summary(&self) -> SuiteSummary {
        SuiteSummary {
            run: self.run,
            errors: self.errors,
            failures: self.failures,
            success: self.success(),
            skipped: self.skipped,
        }
    }
}

/// Summary counters, serialized in the order they are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    #[serde(rename = "tests run")]
    pub run: usize,
    pub errors: usize,
    pub failures: usize,
    pub success: usize,
    pub skipped: usize,
}

impl fmt::Display for SuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary();
        writeln!(f, "tests run: {}", summary.run)?;
        writeln!(f, "errors: {}", summary.errors)?;
        writeln!(f, "failures: {}", summary.failures)?;
        writeln!(f, "success: {}", summary.success)?;
        write!(f, "skipped: {}", summary.skipped)
    }
}
