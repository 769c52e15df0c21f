pub mod http;
pub mod simulator;

use mockall::automock;

use crate::{
    error::SuiteError,
    types::{
        Account, AssetId, AssetInfo, AssetPair, DataEntry, OpenOrder, TransactionRequest,
        TransactionResult, TransactionStatus,
    },
};

pub use http::NodeClient;
pub use simulator::SimulatedLedger;

/// Boundary to the node and matcher.
///
/// Business-rule rejections come back as [`TransactionResult::Rejected`], or as
/// `Err(SuiteError::Rejected)` when the service raises on errors. Every other
/// `Err` is an infrastructure fault.
#[automock]
#[async_trait::async_trait]
pub trait TransactionService: Send + Sync {
    async fn submit(
        &self,
        sender: &Account,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, SuiteError>;

    async fn query_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<OpenOrder>, SuiteError>;

    async fn cancel_order(
        &self,
        sender: &Account,
        pair: &AssetPair,
        order_id: &str,
    ) -> Result<TransactionResult, SuiteError>;

    /// Cancels every open order of `sender` on `pair`, returning the ids the
    /// matcher reported as cancelled. An empty book yields an empty list.
    async fn cancel_all_orders(
        &self,
        sender: &Account,
        pair: &AssetPair,
    ) -> Result<Vec<String>, SuiteError>;

    async fn query_asset_state(&self, asset_id: &AssetId) -> Result<Option<AssetInfo>, SuiteError>;

    async fn transaction_status(&self, id: &str) -> Result<TransactionStatus, SuiteError>;

    async fn data_entry(&self, address: &str, key: &str) -> Result<Option<DataEntry>, SuiteError>;

    fn raises_on_service_error(&self) -> bool;
}

/// Applies the raise-on-error mode to a classified result.
pub fn surface(result: TransactionResult, raise: bool) -> Result<TransactionResult, SuiteError> {
    match result {
        TransactionResult::Rejected(rejection) if raise => Err(SuiteError::Rejected(rejection)),
        other => Ok(other),
    }
}
