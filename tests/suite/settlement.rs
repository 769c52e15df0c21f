use crate::common::*;
use feegate_lib::runner::{ErrorKind, ScenarioStatus};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_slow_settlement_errors_scenario() {
    let config = simulation_config(false);
    let env = slow_environment(&config, Duration::from_secs(600)).expect("Failed to build environment");

    let outcome = run_named(env, "asset_lifecycle").await.expect("Failed to run scenario");

    assert!(
        matches!(outcome.status, ScenarioStatus::Errored { kind: ErrorKind::SettlementTimeout, .. }),
        "unexpected status {:?}",
        outcome.status
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_error_not_failure() {
    let config = simulation_config(false);
    let env = slow_environment(&config, Duration::from_secs(600)).expect("Failed to build environment");

    let scenarios: Vec<_> = ["transfer_fee_boundary", "lease_and_cancel"]
        .into_iter()
        .filter_map(feegate_lib::scenarios::find)
        .collect();
    let result = run_scenarios(env, &scenarios).await;

    assert_eq!(result.run, 2);
    assert_eq!(result.errors, 1);
    assert_eq!(result.failures, 0);
    assert_eq!(result.success(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settlement_within_wait_passes() {
    let mut config = simulation_config(false);
    config.settlement.max_wait_secs = 30;
    config.settlement.poll_interval_ms = 1_000;
    let env = slow_environment(&config, Duration::from_secs(10)).expect("Failed to build environment");

    let outcome = run_named(env, "data_transaction").await.expect("Failed to run scenario");

    assert_eq!(outcome.status, ScenarioStatus::Passed);
}
