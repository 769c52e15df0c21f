use std::sync::Arc;

use super::{
    expectation::Expectation,
    lifecycle::{LeaseState, LeaseTracker, OrderState, OrderTracker},
    result::StepFailure,
    settlement::await_settlement,
    ScenarioError,
};
use crate::{
    config::{Config, SettlementConfig, SuiteConfig},
    error::SuiteError,
    fee::FeeSchedule,
    service::TransactionService,
    types::{
        AcceptedTransaction, Account, AssetId, AssetInfo, AssetPair, DataEntry, Operation,
        TransactionRequest, TransactionResult, TransactionStatus,
    },
};

/// Everything a scenario may use, built once per suite run.
#[derive(Clone)]
pub struct SuiteEnvironment {
    pub service: Arc<dyn TransactionService>,
    pub primary: Account,
    pub counterparty: Account,
    pub market_asset: AssetId,
    pub fees: FeeSchedule,
    pub settlement: SettlementConfig,
    pub suite: SuiteConfig,
}

impl SuiteEnvironment {
    pub fn from_config(
        config: &Config,
        service: Arc<dyn TransactionService>,
    ) -> Result<Self, SuiteError> {
        Ok(Self {
            service,
            primary: config.primary_account(),
            counterparty: config.counterparty_account(),
            market_asset: config.market_asset()?,
            fees: config.fees.clone(),
            settlement: config.settlement.clone(),
            suite: config.suite.clone(),
        })
    }

    pub fn market_pair(&self) -> AssetPair {
        AssetPair::against_native(self.market_asset.clone())
    }
}

/// Per-scenario state: recorded failures and the orders and leases the
/// scenario has opened. Every request is sent by the primary account.
pub struct ScenarioContext {
    env: SuiteEnvironment,
    failures: Vec<StepFailure>,
    orders: OrderTracker,
    leases: LeaseTracker,
}

impl ScenarioContext {
    pub fn new(env: SuiteEnvironment) -> Self {
        Self {
            env,
            failures: vec![],
            orders: OrderTracker::default(),
            leases: LeaseTracker::default(),
        }
    }

    pub fn env(&self) -> &SuiteEnvironment {
        &self.env
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.env.fees
    }

    pub fn order_state(&self, order_id: &str) -> OrderState {
        self.orders.state(order_id)
    }

    pub fn lease_state(&self, lease_id: &str) -> LeaseState {
        self.leases.state(lease_id)
    }

    /// Records a failure unless `condition` holds. Returns `condition`.
    pub fn check(&mut self, step: &str, condition: bool, expected: &str, actual: &str) -> bool {
        if !condition {
            tracing::warn!("{step}: expected {expected}, got {actual}");
            self.failures.push(StepFailure {
                step: step.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        condition
    }

    /// Submits `request` and checks the classified outcome against
    /// `expected`. A mismatch is recorded and the scenario carries on; the
    /// accepted transaction, if any, is returned for later steps.
    ///
    /// A raised rejection counts as the step's outcome when a rejection was
    /// expected, and aborts the scenario otherwise. A service that does not
    /// raise must never return one.
    pub async fn step(
        &mut self,
        step: &str,
        request: TransactionRequest,
        expected: Expectation,
    ) -> Result<Option<AcceptedTransaction>, ScenarioError> {
        tracing::debug!("{step}: submitting {} with fee {}", request.kind(), request.effective_fee());

        let result = match self.env.service.submit(&self.env.primary, &request).await {
            Ok(result) => result,
            Err(SuiteError::Rejected(rejection)) if !self.env.service.raises_on_service_error() => {
                return Err(SuiteError::MalformedResponse(format!(
                    "{step}: service raised a rejection outside raise mode: {}",
                    rejection.message
                ))
                .into())
            }
            Err(SuiteError::Rejected(rejection)) if !expected.expects_success() => {
                TransactionResult::Rejected(rejection)
            }
            Err(err @ SuiteError::Rejected(_)) => {
                return Err(ScenarioError::Unexpected { step: step.to_string(), source: err })
            }
            Err(err) => return Err(err.into()),
        };

        self.track(step, &request, &result);

        match expected.check(&result) {
            Ok(()) => tracing::info!("{step}: {}", result.classification()),
            Err(actual) => {
                self.check(step, false, &expected.to_string(), &actual);
            }
        }

        Ok(result.accepted().cloned())
    }

    /// Like [`step`](Self::step), but later steps need the accepted
    /// transaction: anything else stops the scenario.
    pub async fn required_step(
        &mut self,
        step: &str,
        request: TransactionRequest,
        expected: Expectation,
    ) -> Result<AcceptedTransaction, ScenarioError> {
        self.step(step, request, expected)
            .await?
            .ok_or_else(|| ScenarioError::Mismatch { step: step.to_string() })
    }

    fn track(&mut self, step: &str, request: &TransactionRequest, result: &TransactionResult) {
        let Some(tx) = result.accepted() else {
            return;
        };
        match &request.operation {
            Operation::PlaceOrder { pair, .. } => self.orders.placed(&tx.id, pair),
            Operation::Lease { .. } => self.leases.opened(&tx.id),
            Operation::CancelLease { lease_id } => {
                if let Err(violation) = self.leases.cancelled(lease_id) {
                    self.check(step, false, "a pending lease", &violation);
                }
            }
            _ => {}
        }
    }

    /// Checks the fee boundary of one operation: `minimum - 1` must be
    /// rejected for insufficient fee and `minimum` accepted. Returns the
    /// transaction accepted at `minimum`.
    pub async fn fee_boundary<F>(
        &mut self,
        step: &str,
        minimum: u64,
        build: F,
    ) -> Result<Option<AcceptedTransaction>, ScenarioError>
    where
        F: Fn(u64) -> TransactionRequest + Send,
    {
        if let Some(below) = minimum.checked_sub(1) {
            self.step(&format!("{step} @ {below}"), build(below), Expectation::insufficient_fee())
                .await?;
        }
        self.step(&format!("{step} @ {minimum}"), build(minimum), Expectation::success()).await
    }

    /// Places an order and always cancels every open order on its pair
    /// afterwards, whatever the placement returned.
    pub async fn place_order_scoped(
        &mut self,
        step: &str,
        request: TransactionRequest,
        expected: Expectation,
    ) -> Result<Option<AcceptedTransaction>, ScenarioError> {
        let Operation::PlaceOrder { pair, .. } = &request.operation else {
            return Err(SuiteError::Config(format!("{step}: not an order request")).into());
        };
        let pair = pair.clone();

        let placed = self.step(step, request, expected).await;
        let released = self.release_orders(&pair).await;

        let placed = placed?;
        released?;
        Ok(placed)
    }

    /// Cancels all open orders of the primary account on `pair` and settles
    /// the tracked orders. Returns the ids the matcher reported as cancelled.
    pub async fn release_orders(&mut self, pair: &AssetPair) -> Result<Vec<String>, ScenarioError> {
        let service = &self.env.service;
        let reported = service.cancel_all_orders(&self.env.primary, pair).await?;
        let still_open: Vec<String> = service
            .query_orders(&self.env.primary, pair)
            .await?
            .into_iter()
            .map(|order| order.id)
            .collect();

        tracing::debug!("Cancelled {} order(s), {} still open", reported.len(), still_open.len());
        self.orders.release(pair, &reported, &still_open);
        Ok(reported)
    }

    /// Waits until an issued asset is visible to the service.
    pub async fn await_asset(&self, asset_id: &AssetId) -> Result<AssetInfo, ScenarioError> {
        let service = &self.env.service;
        await_settlement(
            &format!("asset {asset_id}"),
            move || async move { Ok(service.query_asset_state(asset_id).await?.is_some()) },
            self.env.settlement.max_wait(),
            self.env.settlement.poll_interval(),
        )
        .await?;

        self.env.service.query_asset_state(asset_id).await?.ok_or_else(|| {
            SuiteError::MalformedResponse(format!("asset {asset_id} vanished after settling")).into()
        })
    }

    /// Waits until a transaction is confirmed in a block.
    pub async fn await_transaction(&self, id: &str) -> Result<(), ScenarioError> {
        let service = &self.env.service;
        await_settlement(
            &format!("transaction {id}"),
            move || async move {
                Ok(matches!(
                    service.transaction_status(id).await?,
                    TransactionStatus::Confirmed { .. }
                ))
            },
            self.env.settlement.max_wait(),
            self.env.settlement.poll_interval(),
        )
        .await
        .map_err(ScenarioError::from)
    }

    pub async fn data_entry(&self, key: &str) -> Result<Option<DataEntry>, ScenarioError> {
        Ok(self.env.service.data_entry(&self.env.primary.address, key).await?)
    }

    /// Releases any order still pending on its pair and fails the scenario
    /// for each one that stays pending.
    pub(crate) async fn finish(mut self) -> Result<Vec<StepFailure>, ScenarioError> {
        for pair in self.orders.pending_pairs() {
            tracing::warn!("Releasing orders left open on {pair:?}");
            self.release_orders(&pair).await?;
        }

        for (id, _) in self.orders.pending() {
            self.check("order cleanup", false, "no pending order", &format!("order {id} still pending"));
        }

        Ok(self.failures)
    }
}
