use crate::common::*;
use feegate_lib::{runner::ScenarioStatus, scenarios};

async fn assert_catalog_passes(raise_on_service_error: bool) {
    let config = simulation_config(raise_on_service_error);
    let env = simulated_environment(&config).expect("Failed to build environment");

    let result = run_scenarios(env, &scenarios::catalog()).await;

    assert_eq!(result.run, CATALOG_SIZE);
    assert!(result.is_successful(), "unexpected problems:\n{}", describe_problems(&result));
    assert_eq!(result.skipped, SKIPPED_BY_DEFAULT.len());
    assert_eq!(result.success(), CATALOG_SIZE);

    let skipped: Vec<&str> = result
        .outcomes
        .iter()
        .filter(|outcome| outcome.is_skipped())
        .map(|outcome| outcome.name.as_str())
        .collect();
    assert_eq!(skipped, SKIPPED_BY_DEFAULT);
}

#[tokio::test]
async fn test_catalog_passes_with_returned_rejections() {
    assert_catalog_passes(false).await;
}

#[tokio::test]
async fn test_catalog_passes_with_raised_rejections() {
    assert_catalog_passes(true).await;
}

#[tokio::test]
async fn test_catalog_outcomes_follow_catalog_order() {
    let config = simulation_config(false);
    let env = simulated_environment(&config).expect("Failed to build environment");

    let result = run_scenarios(env, &scenarios::catalog()).await;

    let expected: Vec<&str> = scenarios::catalog().iter().map(|s| s.name).collect();
    let actual: Vec<&str> = result.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_spam_runs_when_enabled() {
    let mut config = simulation_config(false);
    config.suite.spam_iterations = 5;
    let env = simulated_environment(&config).expect("Failed to build environment");

    let outcome = run_named(env, "transfer_spam").await.expect("Failed to run scenario");

    assert_eq!(outcome.status, ScenarioStatus::Passed);
}

#[tokio::test]
async fn test_scenarios_are_repeatable_on_one_ledger() {
    let config = simulation_config(false);
    let env = simulated_environment(&config).expect("Failed to build environment");

    for name in ["alias_fee_boundary", "data_transaction", "order_fee_boundary"] {
        for _ in 0..2 {
            let outcome = run_named(env.clone(), name).await.expect("Failed to run scenario");
            assert_eq!(outcome.status, ScenarioStatus::Passed, "{name} did not pass twice");
        }
    }
}

#[tokio::test]
async fn test_higher_fee_schedule_fails_boundaries() {
    // The ledger enforces 3_000_000 while scenarios probe at 2_000_000.
    let mut ledger_config = simulation_config(false);
    ledger_config.fees.transfer = 3_000_000;
    let ledger = feegate_lib::SimulatedLedger::new(&ledger_config).expect("Failed to build ledger");
    let env = feegate_lib::SuiteEnvironment::from_config(
        &simulation_config(false),
        std::sync::Arc::new(ledger),
    )
    .expect("Failed to build environment");

    let outcome = run_named(env, "transfer_fee_boundary").await.expect("Failed to run scenario");

    match outcome.status {
        ScenarioStatus::Failed(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].step, "transfer @ 2000000");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
}

/// Ledger from `simulation_config` with `shift` applied to its fee schedule,
/// while scenarios keep the default minimums.
fn shifted_environment(
    shift: impl FnOnce(&mut feegate_lib::Config),
) -> feegate_lib::SuiteEnvironment {
    let mut ledger_config = simulation_config(false);
    shift(&mut ledger_config);
    let ledger = feegate_lib::SimulatedLedger::new(&ledger_config).expect("Failed to build ledger");
    feegate_lib::SuiteEnvironment::from_config(
        &simulation_config(false),
        std::sync::Arc::new(ledger),
    )
    .expect("Failed to build environment")
}

fn failed_steps(status: ScenarioStatus) -> Vec<String> {
    match status {
        ScenarioStatus::Failed(failures) => failures.into_iter().map(|f| f.step).collect(),
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reissue_accepted_just_below_minimum_fails_lifecycle() {
    let env = shifted_environment(|config| config.fees.reissue = 99_999_999_999);

    let outcome = run_named(env, "asset_lifecycle").await.expect("Failed to run scenario");

    let steps = failed_steps(outcome.status);
    assert!(steps.contains(&"reissue @ 99999999999".to_string()), "{steps:?}");
    assert!(!steps.contains(&"reissue @ 99900000000".to_string()), "{steps:?}");
}

#[tokio::test]
async fn test_lease_cancel_accepted_just_below_minimum_fails() {
    let env = shifted_environment(|config| config.fees.lease_cancel = 19_999_999);

    let outcome = run_named(env, "lease_and_cancel").await.expect("Failed to run scenario");

    let steps = failed_steps(outcome.status);
    assert!(steps.contains(&"lease cancel @ 19999999".to_string()), "{steps:?}");
}
