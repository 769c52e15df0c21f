use crate::common::*;
use feegate_lib::{
    runner::{ErrorKind, ScenarioStatus},
    NodeClient, SuiteEnvironment,
};
use mockito::Server;
use std::sync::Arc;

async fn run_transfer_boundary(raise_on_service_error: bool) -> ScenarioStatus {
    let mut server = Server::new_async().await;
    let config = node_config(&server, raise_on_service_error);
    let address = config.accounts.primary.address.clone();

    let sign_low = mock_sign_transfer(&mut server, &address, 1_999_999, "low").await;
    let sign_ok = mock_sign_transfer(&mut server, &address, 2_000_000, "ok").await;
    let broadcast_low = mock_broadcast_low_fee(&mut server, "low", 1_999_999, 2_000_000).await;
    let broadcast_ok = mock_broadcast_accepts(&mut server, "ok", "4XtransferId", 2_000_000).await;

    let client = NodeClient::new(&config.service).expect("Failed to build client");
    let env = SuiteEnvironment::from_config(&config, Arc::new(client))
        .expect("Failed to build environment");
    let outcome = run_named(env, "transfer_fee_boundary").await.expect("Failed to run scenario");

    sign_low.assert_async().await;
    sign_ok.assert_async().await;
    broadcast_low.assert_async().await;
    broadcast_ok.assert_async().await;
    outcome.status
}

#[tokio::test]
async fn test_transfer_boundary_over_http() {
    assert_eq!(run_transfer_boundary(false).await, ScenarioStatus::Passed);
}

#[tokio::test]
async fn test_transfer_boundary_over_http_with_raised_rejections() {
    assert_eq!(run_transfer_boundary(true).await, ScenarioStatus::Passed);
}

#[tokio::test]
async fn test_server_fault_errors_scenario() {
    let mut server = Server::new_async().await;
    let config = node_config(&server, false);
    let address = config.accounts.primary.address.clone();

    let sign = server
        .mock("POST", format!("/transactions/sign/{address}").as_str())
        .with_status(503)
        .with_body("gateway unavailable")
        .create_async()
        .await;

    let client = NodeClient::new(&config.service).expect("Failed to build client");
    let env = SuiteEnvironment::from_config(&config, Arc::new(client))
        .expect("Failed to build environment");
    let outcome = run_named(env, "transfer_default_fee").await.expect("Failed to run scenario");

    sign.assert_async().await;
    assert!(
        matches!(outcome.status, ScenarioStatus::Errored { kind: ErrorKind::Infrastructure, .. }),
        "unexpected status {:?}",
        outcome.status
    );
}
