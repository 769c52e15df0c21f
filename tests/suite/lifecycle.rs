use crate::common::*;
use anyhow::Result;
use feegate_lib::{
    runner::await_settlement,
    types::{AssetId, AssetRef, Operation, RejectionStage, TransactionRequest, TransactionResult},
    Classification, SimulatedLedger, SuiteError, TransactionService,
};
use std::time::Duration;

fn reissue(asset_id: &AssetId, fee: u64) -> TransactionRequest {
    TransactionRequest::new(Operation::ReissueAsset {
        asset_id: asset_id.clone(),
        quantity: 10_000,
        reissuable: true,
    })
    .with_fee(fee)
}

fn burn(asset_id: &AssetId, fee: u64) -> TransactionRequest {
    TransactionRequest::new(Operation::BurnAsset { asset_id: asset_id.clone(), quantity: 10 })
        .with_fee(fee)
}

fn assert_insufficient_fee(result: &TransactionResult) {
    assert_eq!(result.classification(), Classification::InsufficientFee, "{result:?}");
}

#[tokio::test]
async fn test_issue_reissue_burn_boundaries() -> Result<()> {
    let config = simulation_config(false);
    let ledger = SimulatedLedger::new(&config)?;
    let sender = config.primary_account();

    let issue = TransactionRequest::new(Operation::IssueAsset {
        name: "boundary".to_string(),
        description: "issue reissue burn".to_string(),
        quantity: 10_000_000_000_000_000,
        decimals: 8,
        reissuable: true,
    })
    .with_fee(100_000_000_000);
    let issued = ledger.submit(&sender, &issue).await?;
    let asset_id = issued
        .accepted()
        .and_then(|tx| tx.asset_id.clone())
        .ok_or_else(|| anyhow::anyhow!("issue was not accepted with an asset id: {issued:?}"))?;

    let (service, issued_id) = (&ledger, &asset_id);
    await_settlement(
        "issued asset",
        move || async move { Ok(service.query_asset_state(issued_id).await?.is_some()) },
        Duration::from_secs(5),
        Duration::from_millis(10),
    )
    .await?;

    assert_insufficient_fee(&ledger.submit(&sender, &reissue(&asset_id, 99_900_000_000)).await?);
    assert!(ledger.submit(&sender, &reissue(&asset_id, 100_000_000_000)).await?.accepted().is_some());

    assert_insufficient_fee(&ledger.submit(&sender, &burn(&asset_id, 1_999_999)).await?);
    assert!(ledger.submit(&sender, &burn(&asset_id, 2_000_000)).await?.accepted().is_some());

    let info = ledger
        .query_asset_state(&asset_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("asset disappeared"))?;
    assert_eq!(info.quantity, 10_000_000_000_000_000 + 10_000 - 10);
    Ok(())
}

#[tokio::test]
async fn test_issue_rejection_is_pre_submit() -> Result<()> {
    let config = simulation_config(false);
    let ledger = SimulatedLedger::new(&config)?;

    let issue = TransactionRequest::new(Operation::IssueAsset {
        name: "underpaid".to_string(),
        description: String::new(),
        quantity: 1_000,
        decimals: 2,
        reissuable: false,
    });
    let result = ledger.submit(&config.primary_account(), &issue).await?;

    let rejection = result.rejection().ok_or_else(|| anyhow::anyhow!("issue was accepted"))?;
    assert_eq!(rejection.stage, RejectionStage::PreSubmit);
    assert_eq!(rejection.classification, Classification::InsufficientFee);
    Ok(())
}

#[tokio::test]
async fn test_raised_rejection_carries_classification() -> Result<()> {
    let config = simulation_config(true);
    let ledger = SimulatedLedger::new(&config)?;
    let transfer = TransactionRequest::new(Operation::Transfer {
        recipient: config.counterparty_account().address,
        asset: AssetRef::Native,
        amount: 1,
        fee_asset: AssetRef::Native,
        attachment: None,
    });

    let err = ledger
        .submit(&config.primary_account(), &transfer)
        .await
        .expect_err("default fee must be rejected");

    match err {
        SuiteError::Rejected(rejection) => {
            assert_eq!(rejection.classification, Classification::InsufficientFee);
            assert_eq!(rejection.stage, RejectionStage::ByService);
        }
        other => panic!("expected a raised rejection, got {other:?}"),
    }
    Ok(())
}
