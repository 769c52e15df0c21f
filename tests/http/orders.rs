use crate::common::*;
use feegate_lib::{runner::ScenarioStatus, NodeClient, SuiteEnvironment};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const CANCEL_BODY: &str = r#"^\{"sender":"[^"]+","timestamp":\d+\}$"#;

#[tokio::test]
async fn test_order_boundary_over_http_releases_orders() {
    let mut server = Server::new_async().await;
    let config = node_config(&server, false);
    let address = config.accounts.primary.address.clone();
    let book = format!("/matcher/orderbook/{}/TN", config.market.asset);

    let sign_path = format!("/transactions/sign/{address}");
    let sign_cancel = server
        .mock("POST", sign_path.as_str())
        .match_body(Matcher::Regex(CANCEL_BODY.to_string()))
        .with_status(200)
        .with_body(json!({ "sender": address, "signature": "cancel" }).to_string())
        .expect_at_least(3)
        .create_async()
        .await;
    for (fee, proof) in [(3_999_999u64, "low"), (4_000_000, "ok")] {
        server
            .mock("POST", sign_path.as_str())
            .match_body(Matcher::PartialJson(json!({ "matcherFee": fee })))
            .with_status(200)
            .with_body(json!({ "matcherFee": fee, "proofs": [proof] }).to_string())
            .create_async()
            .await;
    }

    let rejected = server
        .mock("POST", "/matcher/orderbook")
        .match_body(Matcher::PartialJson(json!({ "proofs": ["low"] })))
        .with_status(400)
        .with_body(
            json!({
                "status": "OrderRejected",
                "message": "Required 0.04 TN as fee for this order, but given 0.03999999 TN"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/matcher/orderbook")
        .match_body(Matcher::PartialJson(json!({ "proofs": ["ok"] })))
        .with_status(200)
        .with_body(
            json!({
                "status": "OrderAccepted",
                "message": { "id": "order-1", "matcherFee": 4_000_000 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let cancel = server
        .mock("POST", format!("{book}/cancel").as_str())
        .with_status(200)
        .with_body(
            json!({
                "status": "BatchCancelCompleted",
                "message": [[{ "status": "OrderCanceled", "orderId": "order-1" }]]
            })
            .to_string(),
        )
        .expect_at_least(3)
        .create_async()
        .await;
    let open_orders = server
        .mock("GET", format!("{book}/address/{address}").as_str())
        .match_query(Matcher::UrlEncoded("activeOnly".into(), "true".into()))
        .with_status(200)
        .with_body("[]")
        .expect_at_least(3)
        .create_async()
        .await;

    let client = NodeClient::new(&config.service).expect("Failed to build client");
    let env = SuiteEnvironment::from_config(&config, Arc::new(client))
        .expect("Failed to build environment");
    let outcome = run_named(env, "order_fee_boundary").await.expect("Failed to run scenario");

    assert_eq!(outcome.status, ScenarioStatus::Passed);
    sign_cancel.assert_async().await;
    rejected.assert_async().await;
    accepted.assert_async().await;
    cancel.assert_async().await;
    open_orders.assert_async().await;
}
