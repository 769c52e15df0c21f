use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::{surface, TransactionService};
use crate::{
    classify::{rejection_from_body, rejection_from_text},
    config::ServiceConfig,
    constant::X_API_KEY,
    error::SuiteError,
    sanitize_error,
    types::{
        AcceptedTransaction, Account, AssetId, AssetInfo, AssetPair, AssetRef, DataEntry,
        OpenOrder, Operation, OrderSide, Rejection, RejectionStage, TransactionRequest,
        TransactionResult, TransactionStatus,
    },
};

/// HTTP client for a node with a signing gateway and its matcher.
///
/// Requests are signed by `POST /transactions/sign/{address}` on the node,
/// authorized with the sender's secret as API key, then broadcast to the node
/// or posted to the matcher.
pub struct NodeClient {
    client: Client,
    node_url: String,
    matcher_url: String,
    native_symbol: String,
    raise_on_service_error: bool,
}

impl NodeClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, SuiteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SuiteError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            node_url: config.node_url.trim_end_matches('/').to_string(),
            matcher_url: config.matcher_url.trim_end_matches('/').to_string(),
            native_symbol: config.default_currency.clone(),
            raise_on_service_error: config.raise_on_service_error,
        })
    }

    fn node(&self, path: &str) -> String {
        format!("{}{path}", self.node_url)
    }

    fn matcher(&self, path: &str) -> String {
        format!("{}{path}", self.matcher_url)
    }

    fn orderbook_path(&self, pair: &AssetPair) -> String {
        format!(
            "/matcher/orderbook/{}/{}",
            pair.amount_asset.path_segment(&self.native_symbol),
            pair.price_asset.path_segment(&self.native_symbol)
        )
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Signs `body` through the gateway. `Ok(Err(_))` means the gateway
    /// refused the request before any transaction existed.
    async fn sign(&self, sender: &Account, body: &Value) -> Result<Result<Value, Rejection>, SuiteError> {
        let url = self.node(&format!("/transactions/sign/{}", sender.address));
        tracing::debug!("Signing request for {} via {url}", sender.label);

        let response =
            self.client.post(&url).header(X_API_KEY, sender.secret()).json(body).send().await?;

        match Self::read_body(response, RejectionStage::PreSubmit).await? {
            Ok(signed) => match rejection_from_body(RejectionStage::PreSubmit, &signed) {
                Some(rejection) => Ok(Err(rejection)),
                None => Ok(Ok(signed)),
            },
            Err(rejection) => Ok(Err(rejection)),
        }
    }

    /// Splits a response into a JSON body or a classified rejection.
    /// Server-side failures (5xx) are infrastructure errors.
    async fn read_body(
        response: Response,
        stage: RejectionStage,
    ) -> Result<Result<Value, Rejection>, SuiteError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_server_error() {
            return Err(SuiteError::Network(format!(
                "service answered {status}: {}",
                sanitize_error!(text)
            )));
        }

        if !status.is_success() {
            return Ok(Err(rejection_from_text(stage, &text)));
        }

        serde_json::from_str(&text).map(Ok).map_err(|e| {
            SuiteError::MalformedResponse(format!("expected JSON body: {}", sanitize_error!(e)))
        })
    }

    async fn broadcast(&self, signed: &Value) -> Result<TransactionResult, SuiteError> {
        let response =
            self.client.post(self.node("/transactions/broadcast")).json(signed).send().await?;

        match Self::read_body(response, RejectionStage::ByService).await? {
            Ok(body) => match rejection_from_body(RejectionStage::ByService, &body) {
                Some(rejection) => Ok(TransactionResult::Rejected(rejection)),
                None => Ok(TransactionResult::Accepted(AcceptedTransaction::from_json(body)?)),
            },
            Err(rejection) => Ok(TransactionResult::Rejected(rejection)),
        }
    }

    async fn place_order(&self, sender: &Account, body: &Value) -> Result<TransactionResult, SuiteError> {
        let signed = match self.sign(sender, body).await? {
            Ok(signed) => signed,
            Err(rejection) => return Ok(TransactionResult::Rejected(rejection)),
        };

        let response =
            self.client.post(self.matcher("/matcher/orderbook")).json(&signed).send().await?;

        // The matcher refuses orders before any transaction is formed.
        match Self::read_body(response, RejectionStage::PreSubmit).await? {
            Ok(body) => match rejection_from_body(RejectionStage::PreSubmit, &body) {
                Some(rejection) => Ok(TransactionResult::Rejected(rejection)),
                None => Ok(TransactionResult::Accepted(AcceptedTransaction::from_json(body)?)),
            },
            Err(rejection) => Ok(TransactionResult::Rejected(rejection)),
        }
    }

    async fn send_cancel(
        &self,
        sender: &Account,
        pair: &AssetPair,
        order_id: Option<&str>,
    ) -> Result<Result<Value, Rejection>, SuiteError> {
        let mut body = json!({ "sender": sender.address, "timestamp": Self::now_millis() });
        if let Some(order_id) = order_id {
            body["orderId"] = json!(order_id);
        }

        let signed = match self.sign(sender, &body).await? {
            Ok(signed) => signed,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let url = self.matcher(&format!("{}/cancel", self.orderbook_path(pair)));
        let response = self.client.post(url).json(&signed).send().await?;
        Self::read_body(response, RejectionStage::PreSubmit).await
    }
}

/// Collects every `orderId` string nested anywhere in a matcher cancel report.
fn collect_order_ids(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            if let Some(id) = fields.get("orderId").and_then(Value::as_str) {
                let cancelled = fields
                    .get("status")
                    .and_then(Value::as_str)
                    .is_none_or(|status| status == "OrderCanceled");
                if cancelled {
                    ids.push(id.to_string());
                }
            }
            fields.values().for_each(|v| collect_order_ids(v, ids));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_order_ids(v, ids)),
        _ => {}
    }
}

fn parse_open_order(value: &Value) -> Option<OpenOrder> {
    let status = value.get("status").and_then(Value::as_str).unwrap_or("Accepted");
    if !matches!(status, "Accepted" | "PartiallyFilled") {
        return None;
    }
    let side = match value.get("type").and_then(Value::as_str)? {
        "buy" => OrderSide::Buy,
        "sell" => OrderSide::Sell,
        _ => return None,
    };
    Some(OpenOrder {
        id: value.get("id").and_then(Value::as_str)?.to_string(),
        side,
        amount: value.get("amount").and_then(Value::as_u64)?,
        price: value.get("price").and_then(Value::as_u64)?,
    })
}

fn parse_asset_info(asset_id: &AssetId, body: &Value) -> Result<AssetInfo, SuiteError> {
    let field_u64 = |name: &str| {
        body.get(name).and_then(Value::as_u64).ok_or_else(|| {
            SuiteError::MalformedResponse(format!("asset details without {name}: {body}"))
        })
    };

    Ok(AssetInfo {
        asset_id: asset_id.clone(),
        issuer: body.get("issuer").and_then(Value::as_str).unwrap_or_default().to_string(),
        quantity: field_u64("quantity")?,
        decimals: u8::try_from(field_u64("decimals")?)
            .map_err(|e| SuiteError::MalformedResponse(format!("decimals out of range: {e}")))?,
        reissuable: body.get("reissuable").and_then(Value::as_bool).unwrap_or(false),
        scripted: body.get("scripted").and_then(Value::as_bool).unwrap_or(false),
        min_sponsored_asset_fee: body.get("minSponsoredAssetFee").and_then(Value::as_u64),
    })
}

#[async_trait::async_trait]
impl TransactionService for NodeClient {
    async fn submit(
        &self,
        sender: &Account,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, SuiteError> {
        let timestamp = request.timestamp.filter(|t| *t > 0).unwrap_or_else(Self::now_millis);
        let body = request.to_json(&sender.address, timestamp);
        tracing::debug!("Submitting {} (fee {})", request.kind(), request.effective_fee());

        let result = match &request.operation {
            Operation::PlaceOrder { .. } => self.place_order(sender, &body).await?,
            Operation::CancelOrders { pair } => match self.send_cancel(sender, pair, None).await? {
                Ok(report) => {
                    let mut ids = vec![];
                    collect_order_ids(&report, &mut ids);
                    TransactionResult::Accepted(AcceptedTransaction {
                        id: ids.join(","),
                        asset_id: None,
                        fee: 0,
                        fee_asset: AssetRef::Native,
                        raw: report,
                    })
                }
                Err(rejection) => TransactionResult::Rejected(rejection),
            },
            _ => match self.sign(sender, &body).await? {
                Ok(signed) => self.broadcast(&signed).await?,
                Err(rejection) => TransactionResult::Rejected(rejection),
            },
        };

        surface(result, self.raise_on_service_error)
    }

    async fn query_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<OpenOrder>, SuiteError> {
        let url = self.matcher(&format!(
            "{}/address/{}?activeOnly=true",
            self.orderbook_path(pair),
            sender.address
        ));
        let response = self.client.get(url).header(X_API_KEY, sender.secret()).send().await?;

        match Self::read_body(response, RejectionStage::PreSubmit).await? {
            Ok(Value::Array(orders)) => Ok(orders.iter().filter_map(parse_open_order).collect()),
            Ok(other) => {
                Err(SuiteError::MalformedResponse(format!("expected order list, got {other}")))
            }
            Err(rejection) => Err(SuiteError::Rejected(rejection)),
        }
    }

    async fn cancel_order(
        &self,
        sender: &Account,
        pair: &AssetPair,
        order_id: &str,
    ) -> Result<TransactionResult, SuiteError> {
        let result = match self.send_cancel(sender, pair, Some(order_id)).await? {
            Ok(body) => match rejection_from_body(RejectionStage::PreSubmit, &body) {
                Some(rejection) => TransactionResult::Rejected(rejection),
                None => TransactionResult::Accepted(AcceptedTransaction {
                    id: order_id.to_string(),
                    asset_id: None,
                    fee: 0,
                    fee_asset: AssetRef::Native,
                    raw: body,
                }),
            },
            Err(rejection) => TransactionResult::Rejected(rejection),
        };
        surface(result, self.raise_on_service_error)
    }

    async fn cancel_all_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<String>, SuiteError> {
        match self.send_cancel(sender, pair, None).await? {
            Ok(report) => {
                let mut ids = vec![];
                collect_order_ids(&report, &mut ids);
                Ok(ids)
            }
            Err(rejection) => Err(SuiteError::Rejected(rejection)),
        }
    }

    async fn query_asset_state(&self, asset_id: &AssetId) -> Result<Option<AssetInfo>, SuiteError> {
        let response =
            self.client.get(self.node(&format!("/assets/details/{asset_id}"))).send().await?;

        match Self::read_body(response, RejectionStage::ByService).await? {
            Ok(body) if body.get("error").is_some() => Ok(None),
            Ok(body) => parse_asset_info(asset_id, &body).map(Some),
            // Unknown or not yet settled assets come back as 4xx.
            Err(_) => Ok(None),
        }
    }

    async fn transaction_status(&self, id: &str) -> Result<TransactionStatus, SuiteError> {
        let response = self.client.get(self.node(&format!("/transactions/info/{id}"))).send().await?;
        if response.status() == StatusCode::OK {
            let body: Value = response.json().await?;
            if let Some(height) = body.get("height").and_then(Value::as_u64) {
                return Ok(TransactionStatus::Confirmed { height });
            }
        }

        let response = self
            .client
            .get(self.node(&format!("/transactions/unconfirmed/info/{id}")))
            .send()
            .await?;
        if response.status() == StatusCode::OK {
            return Ok(TransactionStatus::Unconfirmed);
        }

        Ok(TransactionStatus::Unknown)
    }

    async fn data_entry(&self, address: &str, key: &str) -> Result<Option<DataEntry>, SuiteError> {
        let response =
            self.client.get(self.node(&format!("/addresses/data/{address}/{key}"))).send().await?;

        match Self::read_body(response, RejectionStage::ByService).await? {
            Ok(body) if body.get("error").is_some() => Ok(None),
            Ok(body) => DataEntry::from_json(&body).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn raises_on_service_error(&self) -> bool {
        self.raise_on_service_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use mockito::{Matcher, Server};

    const ASSET: &str = "2GRJaVYhhQPKVoWQFyJfTfx3eB5DD7CPdG7ZYx3Cs6Mk";

    fn client_for(server: &Server, raise: bool) -> NodeClient {
        NodeClient::new(&ServiceConfig {
            node_url: server.url(),
            matcher_url: server.url(),
            default_currency: "TN".to_string(),
            raise_on_service_error: raise,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn sender() -> Account {
        Account::new("primary", "3Jsender", "node-api-key")
    }

    fn transfer(fee: u64) -> TransactionRequest {
        TransactionRequest::new(Operation::Transfer {
            recipient: "3Jsender".to_string(),
            asset: AssetRef::Native,
            amount: 1,
            fee_asset: AssetRef::Native,
            attachment: None,
        })
        .with_fee(fee)
    }

    #[tokio::test]
    async fn test_submit_signs_then_broadcasts() {
        let mut server = Server::new_async().await;
        let sign = server
            .mock("POST", "/transactions/sign/3Jsender")
            .match_header("x-api-key", "node-api-key")
            .match_body(Matcher::PartialJson(json!({ "type": 4, "fee": 2_000_000 })))
            .with_status(200)
            .with_body(r#"{"type":4,"fee":2000000,"proofs":["sig"]}"#)
            .create_async()
            .await;
        let broadcast = server
            .mock("POST", "/transactions/broadcast")
            .match_body(Matcher::PartialJson(json!({ "proofs": ["sig"] })))
            .with_status(200)
            .with_body(r#"{"type":4,"id":"4XtxId","fee":2000000}"#)
            .create_async()
            .await;

        let result = client_for(&server, false).submit(&sender(), &transfer(2_000_000)).await.unwrap();

        sign.assert_async().await;
        broadcast.assert_async().await;
        let accepted = result.accepted().unwrap();
        assert_eq!(accepted.id, "4XtxId");
        assert_eq!(accepted.fee, 2_000_000);
    }

    #[tokio::test]
    async fn test_broadcast_rejection_is_classified() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(200)
            .with_body(r#"{"type":4,"fee":1999999,"proofs":["sig"]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/transactions/broadcast")
            .with_status(400)
            .with_body(r#"{"error":112,"message":"State check failed. Reason: Fee for TransferTransaction (1999999 in TN) does not exceed minimal value of 2000000 TN."}"#)
            .create_async()
            .await;

        let result = client_for(&server, false).submit(&sender(), &transfer(1_999_999)).await.unwrap();

        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.stage, RejectionStage::ByService);
        assert_eq!(rejection.classification, Classification::InsufficientFee);
        assert_eq!(rejection.code, Some(112));
    }

    #[tokio::test]
    async fn test_raise_mode_surfaces_rejection_as_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(403)
            .with_body(r#"{"error":2,"message":"Provided API key is not correct"}"#)
            .create_async()
            .await;

        let err = client_for(&server, true).submit(&sender(), &transfer(2_000_000)).await.unwrap_err();

        assert!(matches!(err, SuiteError::Rejected(r) if r.stage == RejectionStage::PreSubmit));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client_for(&server, false).submit(&sender(), &transfer(2_000_000)).await.unwrap_err();

        assert!(matches!(err, SuiteError::Network(_)));
    }

    #[tokio::test]
    async fn test_order_rejected_by_matcher_is_pre_submit() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(200)
            .with_body(r#"{"matcherFee":3999999,"proofs":["sig"]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/matcher/orderbook")
            .with_status(400)
            .with_body(r#"{"status":"OrderRejected","message":"Required 0.04 TN as fee for this order, but given 0.03999999 TN"}"#)
            .create_async()
            .await;

        let request = TransactionRequest::new(Operation::PlaceOrder {
            pair: AssetPair::against_native(ASSET.parse().unwrap()),
            side: OrderSide::Buy,
            amount: 100_000,
            price: 1_000_000,
            max_lifetime_ms: None,
        })
        .with_fee(3_999_999);

        let result = client_for(&server, false).submit(&sender(), &request).await.unwrap();
        let rejection = result.rejection().unwrap();
        assert_eq!(rejection.stage, RejectionStage::PreSubmit);
        assert_eq!(rejection.classification, Classification::InsufficientFee);
    }

    #[tokio::test]
    async fn test_cancel_all_on_empty_book_returns_no_ids() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(200)
            .with_body(r#"{"sender":"3Jsender","signature":"sig"}"#)
            .create_async()
            .await;
        let cancel = server
            .mock("POST", format!("/matcher/orderbook/{ASSET}/TN/cancel").as_str())
            .with_status(200)
            .with_body(r#"{"status":"BatchCancelCompleted","message":[]}"#)
            .create_async()
            .await;

        let pair = AssetPair::against_native(ASSET.parse().unwrap());
        let ids = client_for(&server, true).cancel_all_orders(&sender(), &pair).await.unwrap();

        cancel.assert_async().await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all_collects_cancelled_ids() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/transactions/sign/3Jsender")
            .with_status(200)
            .with_body(r#"{"signature":"sig"}"#)
            .create_async()
            .await;
        server
            .mock("POST", format!("/matcher/orderbook/{ASSET}/TN/cancel").as_str())
            .with_status(200)
            .with_body(r#"{"status":"BatchCancelCompleted","message":[[{"status":"OrderCanceled","orderId":"o1"},{"status":"OrderCancelRejected","orderId":"o2"}]]}"#)
            .create_async()
            .await;

        let pair = AssetPair::against_native(ASSET.parse().unwrap());
        let ids = client_for(&server, false).cancel_all_orders(&sender(), &pair).await.unwrap();
        assert_eq!(ids, vec!["o1".to_string()]);
    }

    #[tokio::test]
    async fn test_query_orders_keeps_active_only() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/matcher/orderbook/{ASSET}/TN/address/3Jsender").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":"o1","type":"buy","amount":100000,"price":1000000,"status":"Accepted"},{"id":"o2","type":"sell","amount":1,"price":100,"status":"Filled"}]"#)
            .create_async()
            .await;

        let pair = AssetPair::against_native(ASSET.parse().unwrap());
        let orders = client_for(&server, false).query_orders(&sender(), &pair).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "o1");
        assert_eq!(orders[0].side, OrderSide::Buy);
    }

    #[tokio::test]
    async fn test_query_asset_state_unknown_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/assets/details/{ASSET}").as_str())
            .with_status(400)
            .with_body(r#"{"error":4,"message":"Asset not found"}"#)
            .create_async()
            .await;

        let info = client_for(&server, false).query_asset_state(&ASSET.parse().unwrap()).await.unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_query_asset_state_parses_details() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/assets/details/{ASSET}").as_str())
            .with_status(200)
            .with_body(format!(r#"{{"assetId":"{ASSET}","issuer":"3Jsender","quantity":10000,"decimals":8,"reissuable":true,"scripted":false,"minSponsoredAssetFee":null}}"#))
            .create_async()
            .await;

        let info = client_for(&server, false)
            .query_asset_state(&ASSET.parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.quantity, 10_000);
        assert_eq!(info.decimals, 8);
        assert!(info.reissuable);
        assert_eq!(info.min_sponsored_asset_fee, None);
    }

    #[tokio::test]
    async fn test_transaction_status_progression() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/transactions/info/tx1")
            .with_status(404)
            .with_body(r#"{"error":311,"message":"transactions does not exist"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/transactions/unconfirmed/info/tx1")
            .with_status(200)
            .with_body(r#"{"id":"tx1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/transactions/info/tx2")
            .with_status(200)
            .with_body(r#"{"id":"tx2","height":1200}"#)
            .create_async()
            .await;

        let client = client_for(&server, false);
        assert_eq!(client.transaction_status("tx1").await.unwrap(), TransactionStatus::Unconfirmed);
        assert_eq!(
            client.transaction_status("tx2").await.unwrap(),
            TransactionStatus::Confirmed { height: 1200 }
        );
    }

    #[tokio::test]
    async fn test_data_entry_lookup() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/addresses/data/3Jsender/test")
            .with_status(200)
            .with_body(r#"{"key":"test","type":"string","value":"testval 2026-10-19"}"#)
            .create_async()
            .await;

        let entry = client_for(&server, false).data_entry("3Jsender", "test").await.unwrap().unwrap();
        assert_eq!(entry, DataEntry::string("test", "testval 2026-10-19"));
    }

    #[test]
    fn test_collect_order_ids_without_status() {
        let mut ids = vec![];
        collect_order_ids(&json!({ "message": [{ "orderId": "a" }, { "orderId": "b" }] }), &mut ids);
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
