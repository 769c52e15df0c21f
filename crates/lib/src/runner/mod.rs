//! Sequential scenario runner.
//!
//! Scenarios run one after another against a single [`SuiteEnvironment`].
//! Each gets a fresh [`ScenarioContext`]; after the body returns, orders the
//! scenario left open are released and the outcome is resolved to passed,
//! failed, errored or skipped.

pub mod context;
pub mod expectation;
pub mod lifecycle;
pub mod result;
pub mod settlement;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::time::Instant;

use crate::error::SuiteError;

pub use context::{ScenarioContext, SuiteEnvironment};
pub use expectation::Expectation;
pub use result::{
    ErrorKind, ScenarioOutcome, ScenarioStatus, StepFailure, SuiteResult, SuiteSummary,
};
pub use settlement::await_settlement;

#[derive(Error, Debug)]
pub enum ScenarioError {
    /// A step whose output later steps need did not match; the mismatch is
    /// already recorded as a failure.
    #[error("step '{step}' did not produce the result later steps depend on")]
    Mismatch { step: String },

    #[error("step '{step}' raised: {source}")]
    Unexpected { step: String, source: SuiteError },

    #[error("skipped: {0}")]
    Skip(String),

    #[error(transparent)]
    Infra(#[from] SuiteError),
}

pub type ScenarioFn =
    for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<(), ScenarioError>>;

pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub body: ScenarioFn,
}

pub struct ScenarioRunner {
    env: SuiteEnvironment,
    outcomes: Vec<ScenarioOutcome>,
}

impl ScenarioRunner {
    pub fn new(env: SuiteEnvironment) -> Self {
        Self { env, outcomes: vec![] }
    }

    pub fn outcomes(&self) -> &[ScenarioOutcome] {
        &self.outcomes
    }

    pub async fn run_scenario(&mut self, scenario: &Scenario) -> ScenarioOutcome {
        tracing::info!("Running {}: {}", scenario.name, scenario.description);
        let started = Instant::now();

        let mut ctx = ScenarioContext::new(self.env.clone());
        let body = (scenario.body)(&mut ctx).await;
        let finished = ctx.finish().await;

        let status = resolve(body, finished);
        let outcome = ScenarioOutcome {
            name: scenario.name.to_string(),
            status,
            elapsed: started.elapsed(),
        };

        match &outcome.status {
            ScenarioStatus::Passed => tracing::info!("{} passed", outcome.name),
            ScenarioStatus::Failed(failures) => {
                tracing::warn!("{} failed with {} mismatch(es)", outcome.name, failures.len())
            }
            ScenarioStatus::Errored { kind, message } => {
                tracing::error!("{} errored ({kind}): {message}", outcome.name)
            }
            ScenarioStatus::Skipped(reason) => tracing::info!("{} skipped: {reason}", outcome.name),
        }

        self.outcomes.push(outcome.clone());
        outcome
    }

    pub async fn run_all(&mut self, scenarios: &[&Scenario]) {
        for scenario in scenarios {
            self.run_scenario(scenario).await;
        }
    }

    /// Consumes the runner; the result is computed exactly once.
    pub fn finalize(self) -> SuiteResult {
        SuiteResult::from_outcomes(self.outcomes)
    }
}

fn errored(kind: ErrorKind, message: String) -> ScenarioStatus {
    ScenarioStatus::Errored { kind, message }
}

fn resolve(
    body: Result<(), ScenarioError>,
    finished: Result<Vec<StepFailure>, ScenarioError>,
) -> ScenarioStatus {
    let failures = match (body, finished) {
        (Err(ScenarioError::Skip(reason)), _) => return ScenarioStatus::Skipped(reason),
        (Err(ScenarioError::Unexpected { step, source }), _) => {
            return errored(ErrorKind::UnexpectedRejection, format!("{step}: {source}"))
        }
        (Err(ScenarioError::Infra(err)), _) | (_, Err(ScenarioError::Infra(err))) => {
            let kind = match err {
                SuiteError::SettlementTimeout { .. } => ErrorKind::SettlementTimeout,
                _ => ErrorKind::Infrastructure,
            };
            return errored(kind, err.to_string());
        }
        (_, Err(other)) => return errored(ErrorKind::Infrastructure, other.to_string()),
        (Ok(()), Ok(failures)) => failures,
        (Err(mismatch @ ScenarioError::Mismatch { .. }), Ok(mut failures)) => {
            if failures.is_empty() {
                failures.push(StepFailure {
                    step: mismatch.to_string(),
                    expected: "a result later steps can use".to_string(),
                    actual: "none".to_string(),
                });
            }
            failures
        }
    };

    if failures.is_empty() {
        ScenarioStatus::Passed
    } else {
        ScenarioStatus::Failed(failures)
    }
}
