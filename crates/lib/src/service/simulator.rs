//! In-process ledger standing in for a node and matcher.
//!
//! Enforces the configured [`FeeSchedule`], alias rules, and asset, lease,
//! order, sponsorship and data state. Accepted transactions become visible
//! only after a settlement delay measured on the tokio clock, so paused-time
//! tests can step through settlement deterministically.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};
use tokio::time::Instant;

use super::{surface, TransactionService};
use crate::{
    classify::classify_error,
    config::Config,
    constant::{error_code, ALIAS_MAX_LENGTH, ALIAS_MIN_LENGTH},
    error::SuiteError,
    fee::FeeSchedule,
    log::display_amount,
    types::{
        AcceptedTransaction, Account, AssetId, AssetInfo, AssetPair, AssetRef, DataEntry,
        OpenOrder, Operation, OperationKind, Rejection, RejectionStage, TransactionRequest,
        TransactionResult, TransactionStatus,
    },
};

pub const DEFAULT_SIMULATED_SETTLEMENT_MS: u64 = 50;

const ALIAS_ALPHABET: &str = "-.0123456789@_abcdefghijklmnopqrstuvwxyz";
const ASSET_NAME_MIN_BYTES: usize = 4;
const ASSET_NAME_MAX_BYTES: usize = 16;
const ASSET_DESCRIPTION_MAX_BYTES: usize = 1000;
const MAX_DECIMALS: u8 = 8;
const MAX_DATA_ENTRIES: usize = 100;
const MAX_MASS_TRANSFER_RECIPIENTS: usize = 100;
const GENESIS_HEIGHT: u64 = 1_000;
const MARKET_ISSUER: &str = "3XmarketAssetIssuer";

struct Pending<T> {
    value: T,
    settles_at: Instant,
}

impl<T> Pending<T> {
    fn settled(&self, now: Instant) -> Option<&T> {
        (now >= self.settles_at).then_some(&self.value)
    }
}

struct LeaseRecord {
    sender: String,
    settles_at: Instant,
    cancelled: bool,
}

#[derive(Default)]
struct LedgerState {
    height: u64,
    transactions: HashMap<String, Pending<u64>>,
    assets: HashMap<AssetId, Pending<AssetInfo>>,
    aliases: HashSet<String>,
    leases: HashMap<String, LeaseRecord>,
    orders: HashMap<(String, AssetPair), Vec<OpenOrder>>,
    data: HashMap<(String, String), Vec<Pending<DataEntry>>>,
}

impl LedgerState {
    fn settled_asset(&self, id: &AssetId, now: Instant) -> Option<&AssetInfo> {
        self.assets.get(id).and_then(|a| a.settled(now))
    }

    fn settled_asset_mut(&mut self, id: &AssetId, now: Instant) -> Option<&mut AssetInfo> {
        self.assets.get_mut(id).filter(|a| now >= a.settles_at).map(|a| &mut a.value)
    }

    fn pair_exists(&self, pair: &AssetPair, now: Instant) -> bool {
        [&pair.amount_asset, &pair.price_asset]
            .into_iter()
            .all(|asset| asset.issued().is_none_or(|id| self.settled_asset(id, now).is_some()))
    }
}

pub struct SimulatedLedger {
    fees: FeeSchedule,
    native_symbol: String,
    settlement_delay: Duration,
    raise_on_service_error: bool,
    state: Mutex<LedgerState>,
}

fn new_identifier() -> String {
    bs58::encode(rand::random::<[u8; 32]>()).into_string()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn node_name(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Transfer => "TransferTransaction",
        OperationKind::CreateAlias => "CreateAliasTransaction",
        OperationKind::PlaceOrder => "Order",
        OperationKind::CancelOrders => "CancelOrders",
        OperationKind::Lease => "LeaseTransaction",
        OperationKind::CancelLease => "LeaseCancelTransaction",
        OperationKind::IssueAsset | OperationKind::IssueSmartAsset => "IssueTransaction",
        OperationKind::ReissueAsset => "ReissueTransaction",
        OperationKind::BurnAsset => "BurnTransaction",
        OperationKind::SetAssetScript => "SetAssetScriptTransaction",
        OperationKind::SponsorAsset => "SponsorFeeTransaction",
        OperationKind::Data => "DataTransaction",
        OperationKind::MassTransfer => "MassTransferTransaction",
    }
}

fn rejected(stage: RejectionStage, code: Option<i64>, message: String) -> TransactionResult {
    TransactionResult::Rejected(Rejection {
        stage,
        classification: classify_error(code, &message),
        code,
        message,
    })
}

fn state_error(stage: RejectionStage, reason: &str) -> TransactionResult {
    rejected(
        stage,
        Some(error_code::STATE_CHECK_FAILED),
        format!("State check failed. Reason: {reason}"),
    )
}

fn invalid(stage: RejectionStage, code: i64, message: &str) -> TransactionResult {
    rejected(stage, Some(code), message.to_string())
}

/// Node issue requests are refused by the gateway; everything else is
/// refused at broadcast.
fn rejection_stage(kind: OperationKind) -> RejectionStage {
    match kind {
        OperationKind::IssueAsset | OperationKind::PlaceOrder | OperationKind::CancelOrders => {
            RejectionStage::PreSubmit
        }
        _ => RejectionStage::ByService,
    }
}

impl SimulatedLedger {
    /// Builds an empty ledger with the configured market asset already issued.
    pub fn new(config: &Config) -> Result<Self, SuiteError> {
        let market_asset = config.market_asset()?;
        let mut state = LedgerState { height: GENESIS_HEIGHT, ..Default::default() };
        state.assets.insert(
            market_asset.clone(),
            Pending {
                value: AssetInfo {
                    asset_id: market_asset,
                    issuer: MARKET_ISSUER.to_string(),
                    quantity: 100_000_000_000_000,
                    decimals: 8,
                    reissuable: false,
                    scripted: false,
                    min_sponsored_asset_fee: None,
                },
                settles_at: Instant::now(),
            },
        );

        Ok(Self {
            fees: config.fees.clone(),
            native_symbol: config.service.default_currency.clone(),
            settlement_delay: Duration::from_millis(DEFAULT_SIMULATED_SETTLEMENT_MS),
            raise_on_service_error: config.service.raise_on_service_error,
            state: Mutex::new(state),
        })
    }

    pub fn with_settlement_delay(mut self, delay: Duration) -> Self {
        self.settlement_delay = delay;
        self
    }

    fn fee_too_low(&self, kind: OperationKind, fee: u64, minimum: u64, unit: &str) -> TransactionResult {
        state_error(
            rejection_stage(kind),
            &format!(
                "Fee for {} ({fee} in {unit}) does not exceed minimal value of {minimum} {unit}.",
                node_name(kind)
            ),
        )
    }

    /// Native-fee gate shared by every node transaction.
    fn check_fee(&self, request: &TransactionRequest, scripted_asset: bool) -> Option<TransactionResult> {
        let fee = request.effective_fee();
        let minimum = self.fees.minimum_for(request, scripted_asset);
        (fee < minimum).then(|| self.fee_too_low(request.kind(), fee, minimum, &self.native_symbol))
    }

    /// Records an accepted node transaction and returns it.
    fn record(
        &self,
        state: &mut LedgerState,
        sender: &Account,
        request: &TransactionRequest,
        now: Instant,
    ) -> Result<AcceptedTransaction, SuiteError> {
        let id = new_identifier();
        let timestamp = request.timestamp.filter(|t| *t > 0).unwrap_or_else(now_millis);
        let mut raw = request.to_json(&sender.address, timestamp);
        raw["id"] = json!(id);

        state.height += 1;
        state.transactions.insert(
            id.clone(),
            Pending { value: state.height, settles_at: now + self.settlement_delay },
        );

        AcceptedTransaction::from_json(raw)
    }

    fn apply(
        &self,
        state: &mut LedgerState,
        sender: &Account,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, SuiteError> {
        let now = Instant::now();
        let kind = request.kind();
        let stage = rejection_stage(kind);
        let fee = request.effective_fee();

        match &request.operation {
            Operation::Transfer { asset, amount, fee_asset, .. } => {
                if *amount == 0 {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "non-positive amount"));
                }
                if let Some(id) = asset.issued() {
                    if state.settled_asset(id, now).is_none() {
                        return Ok(state_error(stage, "Referenced assetId not found"));
                    }
                }
                match fee_asset.issued() {
                    None => {
                        if let Some(rejection) = self.check_fee(request, false) {
                            return Ok(rejection);
                        }
                    }
                    Some(fee_id) => {
                        let Some(info) = state.settled_asset(fee_id, now) else {
                            return Ok(state_error(stage, "Referenced fee asset not found"));
                        };
                        let Some(minimum) = info.min_sponsored_asset_fee else {
                            return Ok(state_error(stage, "Asset is not sponsored"));
                        };
                        if fee < minimum {
                            return Ok(self.fee_too_low(kind, fee, minimum, fee_id.as_str()));
                        }
                    }
                }
                Ok(TransactionResult::Accepted(self.record(state, sender, request, now)?))
            }

            Operation::CreateAlias { alias } => {
                let length = alias.chars().count();
                if !(ALIAS_MIN_LENGTH..=ALIAS_MAX_LENGTH).contains(&length) {
                    return Ok(invalid(
                        stage,
                        error_code::CUSTOM_VALIDATION,
                        &format!(
                            "Alias '{alias}' length should be between {ALIAS_MIN_LENGTH} and {ALIAS_MAX_LENGTH}"
                        ),
                    ));
                }
                if !alias.chars().all(|c| ALIAS_ALPHABET.contains(c)) {
                    return Ok(invalid(
                        stage,
                        error_code::INVALID_NAME,
                        &format!("Alias should contain only following characters: {ALIAS_ALPHABET}"),
                    ));
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                if state.aliases.contains(alias) {
                    return Ok(state_error(stage, "Alias already claimed"));
                }
                let tx = self.record(state, sender, request, now)?;
                state.aliases.insert(alias.clone());
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::PlaceOrder { pair, side, amount, price, .. } => {
                if *amount == 0 || *price == 0 {
                    return Ok(rejected(stage, None, "Order amount and price must be positive".into()));
                }
                if !state.pair_exists(pair, now) {
                    return Ok(rejected(stage, None, "The asset pair is not known to the matcher".into()));
                }
                if fee < self.fees.order {
                    return Ok(rejected(
                        stage,
                        None,
                        format!(
                            "Required {} {} as fee for this order, but given {} {}",
                            display_amount(self.fees.order),
                            self.native_symbol,
                            display_amount(fee),
                            self.native_symbol
                        ),
                    ));
                }

                let id = new_identifier();
                let mut order = request.to_json(&sender.address, now_millis());
                order["id"] = json!(id);
                state
                    .orders
                    .entry((sender.address.clone(), pair.clone()))
                    .or_default()
                    .push(OpenOrder { id, side: *side, amount: *amount, price: *price });

                let raw = json!({ "status": "OrderAccepted", "message": order });
                Ok(TransactionResult::Accepted(AcceptedTransaction::from_json(raw)?))
            }

            Operation::CancelOrders { pair } => {
                let ids = Self::drain_orders(state, sender, pair);
                Ok(TransactionResult::Accepted(AcceptedTransaction {
                    id: ids.join(","),
                    asset_id: None,
                    fee: 0,
                    fee_asset: AssetRef::Native,
                    raw: Self::cancel_report(&ids),
                }))
            }

            Operation::Lease { recipient, amount } => {
                if *amount == 0 {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "non-positive amount"));
                }
                if *recipient == sender.address {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Cannot lease to self"));
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                state.leases.insert(
                    tx.id.clone(),
                    LeaseRecord {
                        sender: sender.address.clone(),
                        settles_at: now + self.settlement_delay,
                        cancelled: false,
                    },
                );
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::CancelLease { lease_id } => {
                match state.leases.get(lease_id) {
                    Some(lease) if now >= lease.settles_at => {
                        if lease.sender != sender.address {
                            return Ok(state_error(stage, "LeaseTransaction was leased by other sender"));
                        }
                        if lease.cancelled {
                            return Ok(state_error(stage, "Cannot cancel already cancelled lease"));
                        }
                    }
                    _ => return Ok(state_error(stage, "Lease not found")),
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                if let Some(lease) = state.leases.get_mut(lease_id) {
                    lease.cancelled = true;
                }
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::IssueAsset { name, description, quantity, decimals, reissuable } => {
                if let Some(rejection) = Self::check_issue(stage, name, description, *quantity, *decimals) {
                    return Ok(rejection);
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                self.issue(state, sender, request, now, *quantity, *decimals, *reissuable, false)
            }

            Operation::IssueSmartAsset { name, description, quantity, decimals, reissuable, script } => {
                if let Some(rejection) = Self::check_issue(stage, name, description, *quantity, *decimals) {
                    return Ok(rejection);
                }
                if script.trim().is_empty() {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Script is empty"));
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                self.issue(state, sender, request, now, *quantity, *decimals, *reissuable, true)
            }

            Operation::ReissueAsset { asset_id, quantity, reissuable } => {
                let Some(info) = state.settled_asset(asset_id, now) else {
                    return Ok(state_error(stage, "Referenced assetId not found"));
                };
                if info.issuer != sender.address {
                    return Ok(state_error(stage, "Asset was issued by other address"));
                }
                if !info.reissuable {
                    return Ok(state_error(stage, "Asset is not reissuable"));
                }
                let Some(total) = info.quantity.checked_add(*quantity) else {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Asset total value overflow"));
                };
                if let Some(rejection) = self.check_fee(request, info.scripted) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                if let Some(info) = state.settled_asset_mut(asset_id, now) {
                    info.quantity = total;
                    info.reissuable = *reissuable;
                }
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::BurnAsset { asset_id, quantity } => {
                let Some(info) = state.settled_asset(asset_id, now) else {
                    return Ok(state_error(stage, "Referenced assetId not found"));
                };
                if *quantity > info.quantity {
                    return Ok(state_error(stage, "Accounts balance errors"));
                }
                if let Some(rejection) = self.check_fee(request, info.scripted) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                if let Some(info) = state.settled_asset_mut(asset_id, now) {
                    info.quantity -= quantity;
                }
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::SetAssetScript { asset_id, script } => {
                let Some(info) = state.settled_asset(asset_id, now) else {
                    return Ok(state_error(stage, "Referenced assetId not found"));
                };
                if info.issuer != sender.address {
                    return Ok(state_error(stage, "Asset was issued by other address"));
                }
                if !info.scripted {
                    return Ok(state_error(stage, "Cannot set script on an asset issued without a script"));
                }
                if script.trim().is_empty() {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Script is empty"));
                }
                if let Some(rejection) = self.check_fee(request, true) {
                    return Ok(rejection);
                }
                Ok(TransactionResult::Accepted(self.record(state, sender, request, now)?))
            }

            Operation::SponsorAsset { asset_id, min_sponsored_asset_fee } => {
                let Some(info) = state.settled_asset(asset_id, now) else {
                    return Ok(state_error(stage, "Referenced assetId not found"));
                };
                if info.issuer != sender.address {
                    return Ok(state_error(stage, "Asset was issued by other address"));
                }
                if info.scripted {
                    return Ok(state_error(stage, "Sponsorship smart assets is disabled."));
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                if let Some(info) = state.settled_asset_mut(asset_id, now) {
                    info.min_sponsored_asset_fee =
                        (*min_sponsored_asset_fee > 0).then_some(*min_sponsored_asset_fee);
                }
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::Data { entries } => {
                if entries.is_empty() || entries.len() > MAX_DATA_ENTRIES {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Invalid number of data entries"));
                }
                if entries.iter().any(|e| e.key.is_empty()) {
                    return Ok(invalid(stage, error_code::CUSTOM_VALIDATION, "Empty key found"));
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                let tx = self.record(state, sender, request, now)?;
                for entry in entries {
                    state
                        .data
                        .entry((sender.address.clone(), entry.key.clone()))
                        .or_default()
                        .push(Pending { value: entry.clone(), settles_at: now + self.settlement_delay });
                }
                Ok(TransactionResult::Accepted(tx))
            }

            Operation::MassTransfer { asset, transfers, .. } => {
                if transfers.len() > MAX_MASS_TRANSFER_RECIPIENTS {
                    return Ok(invalid(
                        stage,
                        error_code::CUSTOM_VALIDATION,
                        "Number of transfers is greater than 100",
                    ));
                }
                if let Some(id) = asset.issued() {
                    if state.settled_asset(id, now).is_none() {
                        return Ok(state_error(stage, "Referenced assetId not found"));
                    }
                }
                if let Some(rejection) = self.check_fee(request, false) {
                    return Ok(rejection);
                }
                Ok(TransactionResult::Accepted(self.record(state, sender, request, now)?))
            }
        }
    }

    fn check_issue(
        stage: RejectionStage,
        name: &str,
        description: &str,
        quantity: u64,
        decimals: u8,
    ) -> Option<TransactionResult> {
        if !(ASSET_NAME_MIN_BYTES..=ASSET_NAME_MAX_BYTES).contains(&name.len()) {
            return Some(invalid(stage, error_code::INVALID_NAME, "invalid asset name"));
        }
        if description.len() > ASSET_DESCRIPTION_MAX_BYTES {
            return Some(invalid(stage, error_code::CUSTOM_VALIDATION, "Too big sequence requested"));
        }
        if quantity == 0 {
            return Some(invalid(stage, error_code::CUSTOM_VALIDATION, "non-positive quantity"));
        }
        if decimals > MAX_DECIMALS {
            return Some(invalid(stage, error_code::CUSTOM_VALIDATION, "Too big decimals"));
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn issue(
        &self,
        state: &mut LedgerState,
        sender: &Account,
        request: &TransactionRequest,
        now: Instant,
        quantity: u64,
        decimals: u8,
        reissuable: bool,
        scripted: bool,
    ) -> Result<TransactionResult, SuiteError> {
        let mut tx = self.record(state, sender, request, now)?;
        let asset_id: AssetId = tx.id.parse()?;
        tx.raw["assetId"] = json!(asset_id);
        tx.asset_id = Some(asset_id.clone());

        state.assets.insert(
            asset_id.clone(),
            Pending {
                value: AssetInfo {
                    asset_id,
                    issuer: sender.address.clone(),
                    quantity,
                    decimals,
                    reissuable,
                    scripted,
                    min_sponsored_asset_fee: None,
                },
                settles_at: now + self.settlement_delay,
            },
        );
        Ok(TransactionResult::Accepted(tx))
    }

    fn drain_orders(state: &mut LedgerState, sender: &Account, pair: &AssetPair) -> Vec<String> {
        state
            .orders
            .remove(&(sender.address.clone(), pair.clone()))
            .unwrap_or_default()
            .into_iter()
            .map(|order| order.id)
            .collect()
    }

    fn cancel_report(ids: &[String]) -> Value {
        let cancelled: Vec<Value> =
            ids.iter().map(|id| json!({ "status": "OrderCanceled", "orderId": id })).collect();
        json!({ "status": "BatchCancelCompleted", "message": [cancelled] })
    }
}

#[async_trait::async_trait]
impl TransactionService for SimulatedLedger {
    async fn submit(
        &self,
        sender: &Account,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, SuiteError> {
        let result = {
            let mut state = self.state.lock();
            self.apply(&mut state, sender, request)?
        };

        match &result {
            TransactionResult::Accepted(tx) => {
                tracing::debug!("Simulated {} accepted as {} (fee {})", request.kind(), tx.id, tx.fee)
            }
            TransactionResult::Rejected(rejection) => {
                tracing::debug!("Simulated {} {}: {}", request.kind(), rejection.stage, rejection.message)
            }
        }

        surface(result, self.raise_on_service_error)
    }

    async fn query_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<OpenOrder>, SuiteError> {
        let state = self.state.lock();
        Ok(state.orders.get(&(sender.address.clone(), pair.clone())).cloned().unwrap_or_default())
    }

    async fn cancel_order(
        &self,
        sender: &Account,
        pair: &AssetPair,
        order_id: &str,
    ) -> Result<TransactionResult, SuiteError> {
        let result = {
            let mut state = self.state.lock();
            let book = state.orders.entry((sender.address.clone(), pair.clone())).or_default();
            match book.iter().position(|order| order.id == order_id) {
                Some(index) => {
                    book.remove(index);
                    TransactionResult::Accepted(AcceptedTransaction {
                        id: order_id.to_string(),
                        asset_id: None,
                        fee: 0,
                        fee_asset: AssetRef::Native,
                        raw: json!({ "status": "OrderCanceled", "orderId": order_id }),
                    })
                }
                None => rejected(
                    RejectionStage::PreSubmit,
                    None,
                    format!("Order {order_id} not found"),
                ),
            }
        };
        surface(result, self.raise_on_service_error)
    }

    async fn cancel_all_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<String>, SuiteError> {
        let mut state = self.state.lock();
        Ok(Self::drain_orders(&mut state, sender, pair))
    }

    async fn query_asset_state(&self, asset_id: &AssetId) -> Result<Option<AssetInfo>, SuiteError> {
        let state = self.state.lock();
        Ok(state.settled_asset(asset_id, Instant::now()).cloned())
    }

    async fn transaction_status(&self, id: &str) -> Result<TransactionStatus, SuiteError> {
        let state = self.state.lock();
        Ok(match state.transactions.get(id) {
            Some(tx) => match tx.settled(Instant::now()) {
                Some(height) => TransactionStatus::Confirmed { height: *height },
                None => TransactionStatus::Unconfirmed,
            },
            None => TransactionStatus::Unknown,
        })
    }

    async fn data_entry(&self, address: &str, key: &str) -> Result<Option<DataEntry>, SuiteError> {
        let state = self.state.lock();
        let now = Instant::now();
        Ok(state
            .data
            .get(&(address.to_string(), key.to_string()))
            .and_then(|history| history.iter().rev().find_map(|entry| entry.settled(now)))
            .cloned())
    }

    fn raises_on_service_error(&self) -> bool {
        self.raise_on_service_error
    }
}
