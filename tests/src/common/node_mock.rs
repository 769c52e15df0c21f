use feegate_lib::Config;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use crate::common::PRIMARY_API_KEY;

/// Config pointing node and matcher at a mock server.
pub fn node_config(server: &ServerGuard, raise_on_service_error: bool) -> Config {
    let mut config = Config::for_simulation();
    config.service.node_url = server.url();
    config.service.matcher_url = server.url();
    config.service.raise_on_service_error = raise_on_service_error;
    config.accounts.primary.secret = PRIMARY_API_KEY.to_string();
    config
}

/// Gateway accepting a transfer at `fee` and tagging the signed copy with
/// `proof`, so the matching broadcast can be told apart.
pub async fn mock_sign_transfer(server: &mut ServerGuard, address: &str, fee: u64, proof: &str) -> Mock {
    server
        .mock("POST", format!("/transactions/sign/{address}").as_str())
        .match_header("x-api-key", PRIMARY_API_KEY)
        .match_body(Matcher::PartialJson(json!({ "type": 4, "fee": fee })))
        .with_status(200)
        .with_body(json!({ "type": 4, "fee": fee, "proofs": [proof] }).to_string())
        .create_async()
        .await
}

pub async fn mock_broadcast_accepts(server: &mut ServerGuard, proof: &str, id: &str, fee: u64) -> Mock {
    server
        .mock("POST", "/transactions/broadcast")
        .match_body(Matcher::PartialJson(json!({ "proofs": [proof] })))
        .with_status(200)
        .with_body(json!({ "type": 4, "id": id, "fee": fee }).to_string())
        .create_async()
        .await
}

pub async fn mock_broadcast_low_fee(server: &mut ServerGuard, proof: &str, fee: u64, minimum: u64) -> Mock {
    let message = format!(
        "State check failed. Reason: Fee for TransferTransaction ({fee} in TN) does not exceed minimal value of {minimum} TN."
    );
    server
        .mock("POST", "/transactions/broadcast")
        .match_body(Matcher::PartialJson(json!({ "proofs": [proof] })))
        .with_status(400)
        .with_body(json!({ "error": 112, "message": message }).to_string())
        .create_async()
        .await
}
