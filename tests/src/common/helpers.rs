use anyhow::Result;
use feegate_lib::{
    runner::{Scenario, ScenarioOutcome, ScenarioStatus},
    scenarios, Config, ScenarioRunner, SimulatedLedger, SuiteEnvironment, SuiteResult,
    TransactionService,
};
use std::{sync::Arc, time::Duration};

/// Simulation config with the service raising on rejections or not.
pub fn simulation_config(raise_on_service_error: bool) -> Config {
    let mut config = Config::for_simulation();
    config.service.raise_on_service_error = raise_on_service_error;
    config
}

pub fn simulated_environment(config: &Config) -> Result<SuiteEnvironment> {
    let ledger = SimulatedLedger::new(config)?;
    Ok(SuiteEnvironment::from_config(config, Arc::new(ledger))?)
}

/// Environment whose ledger settles after `delay` instead of the default.
pub fn slow_environment(config: &Config, delay: Duration) -> Result<SuiteEnvironment> {
    let ledger = SimulatedLedger::new(config)?.with_settlement_delay(delay);
    let service: Arc<dyn TransactionService> = Arc::new(ledger);
    Ok(SuiteEnvironment::from_config(config, service)?)
}

pub async fn run_scenarios(env: SuiteEnvironment, scenarios: &[Scenario]) -> SuiteResult {
    let mut runner = ScenarioRunner::new(env);
    let selected: Vec<&Scenario> = scenarios.iter().collect();
    runner.run_all(&selected).await;
    runner.finalize()
}

pub async fn run_named(env: SuiteEnvironment, name: &str) -> Result<ScenarioOutcome> {
    let scenario = scenarios::find(name)
        .ok_or_else(|| anyhow::anyhow!("scenario {name} is not in the catalog"))?;
    let mut runner = ScenarioRunner::new(env);
    Ok(runner.run_scenario(&scenario).await)
}

/// Human-readable list of everything that did not pass or skip.
pub fn describe_problems(result: &SuiteResult) -> String {
    result
        .outcomes
        .iter()
        .filter_map(|outcome| match &outcome.status {
            ScenarioStatus::Passed | ScenarioStatus::Skipped(_) => None,
            ScenarioStatus::Failed(failures) => Some(format!(
                "{}: {}",
                outcome.name,
                failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            )),
            ScenarioStatus::Errored { kind, message } => {
                Some(format!("{} ({kind}): {message}", outcome.name))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
