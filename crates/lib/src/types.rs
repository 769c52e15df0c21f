use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::{fmt, str::FromStr};

use crate::{classify::Classification, error::SuiteError};

/// Decoded length of asset and transaction identifiers
pub const IDENTIFIER_BYTES: usize = 32;

/// An identity able to submit transactions through the signing gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub label: String,
    pub address: String,
    secret: String,
}

impl Account {
    pub fn new(label: &str, address: &str, secret: &str) -> Self {
        Self { label: label.to_string(), address: address.to_string(), secret: secret.to_string() }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("label", &self.label)
            .field("address", &self.address)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AssetId {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| SuiteError::InvalidIdentifier(format!("{s}: {e}")))?;
        if decoded.len() != IDENTIFIER_BYTES {
            return Err(SuiteError::InvalidIdentifier(format!(
                "{s}: expected {IDENTIFIER_BYTES} bytes, got {}",
                decoded.len()
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either the network's native currency or an issued asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    Native,
    Issued(AssetId),
}

impl AssetRef {
    /// JSON form used by the node and matcher: `null` for the native currency.
    pub fn to_json(&self) -> Value {
        match self {
            AssetRef::Native => Value::Null,
            AssetRef::Issued(id) => Value::String(id.to_string()),
        }
    }

    /// Path segment form used by matcher URLs.
    pub fn path_segment(&self, native_symbol: &str) -> String {
        match self {
            AssetRef::Native => native_symbol.to_string(),
            AssetRef::Issued(id) => id.to_string(),
        }
    }

    pub fn issued(&self) -> Option<&AssetId> {
        match self {
            AssetRef::Native => None,
            AssetRef::Issued(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPair {
    pub amount_asset: AssetRef,
    pub price_asset: AssetRef,
}

impl AssetPair {
    pub fn new(amount_asset: AssetRef, price_asset: AssetRef) -> Self {
        Self { amount_asset, price_asset }
    }

    /// Pair quoting `asset` against the native currency.
    pub fn against_native(asset: AssetId) -> Self {
        Self::new(AssetRef::Issued(asset), AssetRef::Native)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub key: String,
    pub value: DataValue,
}

impl DataEntry {
    pub fn string(key: &str, value: &str) -> Self {
        Self { key: key.to_string(), value: DataValue::String(value.to_string()) }
    }

    pub fn to_json(&self) -> Value {
        let (kind, value) = match &self.value {
            DataValue::String(s) => ("string", json!(s)),
            DataValue::Integer(i) => ("integer", json!(i)),
            DataValue::Boolean(b) => ("boolean", json!(b)),
        };
        json!({ "key": self.key, "type": kind, "value": value })
    }

    pub fn from_json(value: &Value) -> Result<Self, SuiteError> {
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| SuiteError::MalformedResponse(format!("data entry without key: {value}")))?;
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let raw = value.get("value");
        let parsed = match (kind, raw) {
            ("string", Some(Value::String(s))) => Some(DataValue::String(s.clone())),
            ("integer", Some(v)) => v.as_i64().map(DataValue::Integer),
            ("boolean", Some(Value::Bool(b))) => Some(DataValue::Boolean(*b)),
            _ => None,
        }
        .ok_or_else(|| {
            SuiteError::MalformedResponse(format!("unsupported data entry {kind} for key {key}"))
        })?;
        Ok(Self { key: key.to_string(), value: parsed })
    }

    /// Size used by the per-KiB data fee: key bytes, a type byte, and the value.
    pub fn encoded_len(&self) -> usize {
        let value_len = match &self.value {
            DataValue::String(s) => 2 + s.len(),
            DataValue::Integer(_) => 8,
            DataValue::Boolean(_) => 1,
        };
        2 + self.key.len() + 1 + value_len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassTransferItem {
    pub recipient: String,
    pub amount: u64,
}

/// Operation-specific body of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transfer {
        recipient: String,
        asset: AssetRef,
        amount: u64,
        fee_asset: AssetRef,
        attachment: Option<String>,
    },
    CreateAlias {
        alias: String,
    },
    PlaceOrder {
        pair: AssetPair,
        side: OrderSide,
        amount: u64,
        price: u64,
        max_lifetime_ms: Option<u64>,
    },
    CancelOrders {
        pair: AssetPair,
    },
    Lease {
        recipient: String,
        amount: u64,
    },
    CancelLease {
        lease_id: String,
    },
    IssueAsset {
        name: String,
        description: String,
        quantity: u64,
        decimals: u8,
        reissuable: bool,
    },
    IssueSmartAsset {
        name: String,
        description: String,
        quantity: u64,
        decimals: u8,
        reissuable: bool,
        script: String,
    },
    ReissueAsset {
        asset_id: AssetId,
        quantity: u64,
        reissuable: bool,
    },
    BurnAsset {
        asset_id: AssetId,
        quantity: u64,
    },
    SetAssetScript {
        asset_id: AssetId,
        script: String,
    },
    SponsorAsset {
        asset_id: AssetId,
        min_sponsored_asset_fee: u64,
    },
    Data {
        entries: Vec<DataEntry>,
    },
    MassTransfer {
        asset: AssetRef,
        transfers: Vec<MassTransferItem>,
        attachment: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Transfer,
    CreateAlias,
    PlaceOrder,
    CancelOrders,
    Lease,
    CancelLease,
    IssueAsset,
    IssueSmartAsset,
    ReissueAsset,
    BurnAsset,
    SetAssetScript,
    SponsorAsset,
    Data,
    MassTransfer,
}

impl OperationKind {
    /// Numeric transaction type the node expects; `None` for matcher requests.
    pub fn type_id(&self) -> Option<u8> {
        match self {
            OperationKind::IssueAsset | OperationKind::IssueSmartAsset => Some(3),
            OperationKind::Transfer => Some(4),
            OperationKind::ReissueAsset => Some(5),
            OperationKind::BurnAsset => Some(6),
            OperationKind::Lease => Some(8),
            OperationKind::CancelLease => Some(9),
            OperationKind::CreateAlias => Some(10),
            OperationKind::MassTransfer => Some(11),
            OperationKind::Data => Some(12),
            OperationKind::SponsorAsset => Some(14),
            OperationKind::SetAssetScript => Some(15),
            OperationKind::PlaceOrder | OperationKind::CancelOrders => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Transfer => "transfer",
            OperationKind::CreateAlias => "create-alias",
            OperationKind::PlaceOrder => "place-order",
            OperationKind::CancelOrders => "cancel-orders",
            OperationKind::Lease => "lease",
            OperationKind::CancelLease => "cancel-lease",
            OperationKind::IssueAsset => "issue-asset",
            OperationKind::IssueSmartAsset => "issue-smart-asset",
            OperationKind::ReissueAsset => "reissue-asset",
            OperationKind::BurnAsset => "burn-asset",
            OperationKind::SetAssetScript => "set-asset-script",
            OperationKind::SponsorAsset => "sponsor-asset",
            OperationKind::Data => "data",
            OperationKind::MassTransfer => "mass-transfer",
        };
        f.write_str(name)
    }
}

/// A single request to the transaction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub operation: Operation,
    /// Fee in minor units; `None` lets the client apply its default fee.
    pub fee: Option<u64>,
    /// Milliseconds since epoch; `None` means "now" at submission.
    pub timestamp: Option<i64>,
}

impl TransactionRequest {
    pub fn new(operation: Operation) -> Self {
        Self { operation, fee: None, timestamp: None }
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn kind(&self) -> OperationKind {
        match &self.operation {
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::CreateAlias { .. } => OperationKind::CreateAlias,
            Operation::PlaceOrder { .. } => OperationKind::PlaceOrder,
            Operation::CancelOrders { .. } => OperationKind::CancelOrders,
            Operation::Lease { .. } => OperationKind::Lease,
            Operation::CancelLease { .. } => OperationKind::CancelLease,
            Operation::IssueAsset { .. } => OperationKind::IssueAsset,
            Operation::IssueSmartAsset { .. } => OperationKind::IssueSmartAsset,
            Operation::ReissueAsset { .. } => OperationKind::ReissueAsset,
            Operation::BurnAsset { .. } => OperationKind::BurnAsset,
            Operation::SetAssetScript { .. } => OperationKind::SetAssetScript,
            Operation::SponsorAsset { .. } => OperationKind::SponsorAsset,
            Operation::Data { .. } => OperationKind::Data,
            Operation::MassTransfer { .. } => OperationKind::MassTransfer,
        }
    }

    pub fn effective_fee(&self) -> u64 {
        self.fee.unwrap_or(crate::constant::DEFAULT_TX_FEE)
    }

    /// Unsigned JSON body as submitted to the signing gateway.
    pub fn to_json(&self, sender: &str, timestamp: i64) -> Value {
        let mut body = Map::new();
        if let Some(type_id) = self.kind().type_id() {
            body.insert("type".into(), json!(type_id));
            body.insert("version".into(), json!(2));
        }
        body.insert("sender".into(), json!(sender));
        body.insert("timestamp".into(), json!(timestamp));

        let fee_key = match self.kind() {
            OperationKind::PlaceOrder => "matcherFee",
            _ => "fee",
        };
        if self.kind() != OperationKind::CancelOrders {
            body.insert(fee_key.into(), json!(self.effective_fee()));
        }

        match &self.operation {
            Operation::Transfer { recipient, asset, amount, fee_asset, attachment } => {
                body.insert("recipient".into(), json!(recipient));
                body.insert("assetId".into(), asset.to_json());
                body.insert("amount".into(), json!(amount));
                body.insert("feeAssetId".into(), fee_asset.to_json());
                body.insert("attachment".into(), json!(attachment.clone().unwrap_or_default()));
            }
            Operation::CreateAlias { alias } => {
                body.insert("alias".into(), json!(alias));
            }
            Operation::PlaceOrder { pair, side, amount, price, max_lifetime_ms } => {
                body.insert(
                    "assetPair".into(),
                    json!({
                        "amountAsset": pair.amount_asset.to_json(),
                        "priceAsset": pair.price_asset.to_json(),
                    }),
                );
                body.insert("orderType".into(), json!(side));
                body.insert("amount".into(), json!(amount));
                body.insert("price".into(), json!(price));
                let lifetime = max_lifetime_ms.unwrap_or(DEFAULT_ORDER_LIFETIME_MS);
                body.insert("expiration".into(), json!(timestamp.saturating_add(lifetime as i64)));
            }
            Operation::CancelOrders { pair } => {
                body.insert(
                    "assetPair".into(),
                    json!({
                        "amountAsset": pair.amount_asset.to_json(),
                        "priceAsset": pair.price_asset.to_json(),
                    }),
                );
            }
            Operation::Lease { recipient, amount } => {
                body.insert("recipient".into(), json!(recipient));
                body.insert("amount".into(), json!(amount));
            }
            Operation::CancelLease { lease_id } => {
                body.insert("leaseId".into(), json!(lease_id));
            }
            Operation::IssueAsset { name, description, quantity, decimals, reissuable } => {
                body.insert("name".into(), json!(name));
                body.insert("description".into(), json!(description));
                body.insert("quantity".into(), json!(quantity));
                body.insert("decimals".into(), json!(decimals));
                body.insert("reissuable".into(), json!(reissuable));
            }
            Operation::IssueSmartAsset {
                name,
                description,
                quantity,
                decimals,
                reissuable,
                script,
            } => {
                body.insert("name".into(), json!(name));
                body.insert("description".into(), json!(description));
                body.insert("quantity".into(), json!(quantity));
                body.insert("decimals".into(), json!(decimals));
                body.insert("reissuable".into(), json!(reissuable));
                body.insert("script".into(), json!(script));
            }
            Operation::ReissueAsset { asset_id, quantity, reissuable } => {
                body.insert("assetId".into(), json!(asset_id));
                body.insert("quantity".into(), json!(quantity));
                body.insert("reissuable".into(), json!(reissuable));
            }
            Operation::BurnAsset { asset_id, quantity } => {
                body.insert("assetId".into(), json!(asset_id));
                body.insert("quantity".into(), json!(quantity));
            }
            Operation::SetAssetScript { asset_id, script } => {
                body.insert("assetId".into(), json!(asset_id));
                body.insert("script".into(), json!(script));
            }
            Operation::SponsorAsset { asset_id, min_sponsored_asset_fee } => {
                body.insert("assetId".into(), json!(asset_id));
                body.insert("minSponsoredAssetFee".into(), json!(min_sponsored_asset_fee));
            }
            Operation::Data { entries } => {
                body.insert(
                    "data".into(),
                    Value::Array(entries.iter().map(DataEntry::to_json).collect()),
                );
            }
            Operation::MassTransfer { asset, transfers, attachment } => {
                body.insert("assetId".into(), asset.to_json());
                body.insert(
                    "transfers".into(),
                    Value::Array(
                        transfers
                            .iter()
                            .map(|t| json!({ "recipient": t.recipient, "amount": t.amount }))
                            .collect(),
                    ),
                );
                body.insert("attachment".into(), json!(attachment.clone().unwrap_or_default()));
            }
        }

        Value::Object(body)
    }
}

pub const DEFAULT_ORDER_LIFETIME_MS: u64 = 29 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionStage {
    /// Refused before any transaction response was formed (gateway or matcher).
    PreSubmit,
    /// Broadcast answered with an error payload.
    ByService,
}

impl fmt::Display for RejectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionStage::PreSubmit => f.write_str("rejected pre-submit"),
            RejectionStage::ByService => f.write_str("rejected by service"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub stage: RejectionStage,
    pub classification: Classification,
    pub code: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTransaction {
    pub id: String,
    pub asset_id: Option<AssetId>,
    pub fee: u64,
    pub fee_asset: AssetRef,
    pub raw: Value,
}

impl AcceptedTransaction {
    /// Reads the fields the harness relies on from a node/matcher success body.
    pub fn from_json(raw: Value) -> Result<Self, SuiteError> {
        let id = raw
            .get("id")
            .or_else(|| raw.get("message").and_then(|m| m.get("id")))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SuiteError::MalformedResponse(format!("missing id in {raw}")))?
            .to_string();

        let is_issue = raw.get("type").and_then(Value::as_u64) == Some(3);
        let asset_id = if is_issue {
            // Issue responses may omit assetId; the transaction id doubles as the asset id.
            let source = raw.get("assetId").and_then(Value::as_str).unwrap_or(id.as_str());
            Some(source.parse()?)
        } else {
            None
        };

        let fee = raw
            .get("fee")
            .or_else(|| raw.get("message").and_then(|m| m.get("matcherFee")))
            .and_then(Value::as_u64)
            .unwrap_or_default();

        let fee_asset = match raw.get("feeAssetId").and_then(Value::as_str) {
            Some(s) => AssetRef::Issued(s.parse()?),
            None => AssetRef::Native,
        };

        Ok(Self { id, asset_id, fee, fee_asset, raw })
    }
}

/// Outcome of a single submission.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionResult {
    Accepted(AcceptedTransaction),
    Rejected(Rejection),
}

impl TransactionResult {
    pub fn classification(&self) -> Classification {
        match self {
            TransactionResult::Accepted(_) => Classification::Success,
            TransactionResult::Rejected(rejection) => rejection.classification,
        }
    }

    pub fn accepted(&self) -> Option<&AcceptedTransaction> {
        match self {
            TransactionResult::Accepted(tx) => Some(tx),
            TransactionResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            TransactionResult::Accepted(_) => None,
            TransactionResult::Rejected(rejection) => Some(rejection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
    pub id: String,
    pub side: OrderSide,
    pub amount: u64,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub asset_id: AssetId,
    pub issuer: String,
    pub quantity: u64,
    pub decimals: u8,
    pub reissuable: bool,
    pub scripted: bool,
    pub min_sponsored_asset_fee: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Confirmed { height: u64 },
    Unconfirmed,
    Unknown,
}
