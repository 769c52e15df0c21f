use futures::future::BoxFuture;

use super::{accepted_at_minimum, issued_asset, order::order, random_amount, random_name};
use crate::{
    constant::INSUFFICIENT_FEE_MARKER,
    runner::{Expectation, ScenarioContext, ScenarioError},
    types::{AssetId, AssetPair, AssetRef, Operation, OrderSide, TransactionRequest},
};

const ASSET_SCRIPT: &str = "match tx { \n  case _ => true\n}";

/// Gap between the rejected and the accepted reissue fee.
const REISSUE_FEE_GAP: u64 = 100_000_000;

fn issue(quantity: u64, decimals: u8, reissuable: bool) -> TransactionRequest {
    TransactionRequest::new(Operation::IssueAsset {
        name: random_name(16),
        description: random_name(16),
        quantity,
        decimals,
        reissuable,
    })
}

fn issue_nft() -> TransactionRequest {
    TransactionRequest::new(Operation::IssueAsset {
        name: format!("nft {}", random_name(12)),
        description: format!("nft {}", random_name(12)),
        quantity: 1,
        decimals: 0,
        reissuable: false,
    })
}

fn issue_smart(quantity: u64) -> TransactionRequest {
    TransactionRequest::new(Operation::IssueSmartAsset {
        name: random_name(16),
        description: random_name(16),
        quantity,
        decimals: 8,
        reissuable: true,
        script: ASSET_SCRIPT.to_string(),
    })
}

fn reissue(asset_id: &AssetId, quantity: u64) -> TransactionRequest {
    TransactionRequest::new(Operation::ReissueAsset {
        asset_id: asset_id.clone(),
        quantity,
        reissuable: true,
    })
}

fn burn(asset_id: &AssetId, quantity: u64) -> TransactionRequest {
    TransactionRequest::new(Operation::BurnAsset { asset_id: asset_id.clone(), quantity })
}

/// Reissue rejected well under and just under `minimum`, accepted at `minimum`.
async fn reissue_boundary(
    ctx: &mut ScenarioContext,
    asset_id: &AssetId,
    minimum: u64,
) -> Result<(), ScenarioError> {
    let below = minimum.saturating_sub(REISSUE_FEE_GAP);
    ctx.step(
        &format!("reissue @ {below}"),
        reissue(asset_id, 10_000).with_fee(below),
        Expectation::insufficient_fee(),
    )
    .await?;
    if let Some(just_below) = minimum.checked_sub(1) {
        ctx.step(
            &format!("reissue @ {just_below}"),
            reissue(asset_id, 10_000).with_fee(just_below),
            Expectation::insufficient_fee(),
        )
        .await?;
    }
    ctx.step(
        &format!("reissue @ {minimum}"),
        reissue(asset_id, 10_000).with_fee(minimum),
        Expectation::success(),
    )
    .await?;
    Ok(())
}

pub fn lifecycle(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let quantity: u64 = 10_000_000_000_000_000;
        let issue_fee = ctx.fees().issue;

        ctx.step(
            "issue with default fee",
            issue(quantity, 8, true),
            Expectation::insufficient_fee(),
        )
        .await?;

        let step = format!("issue @ {issue_fee}");
        let issued = ctx
            .required_step(&step, issue(quantity, 8, true).with_fee(issue_fee), Expectation::success())
            .await?;
        let asset_id = issued_asset(ctx, &step, &issued)?;
        ctx.await_asset(&asset_id).await?;

        let reissue_fee = ctx.fees().reissue(false);
        reissue_boundary(ctx, &asset_id, reissue_fee).await?;

        let burn_fee = ctx.fees().burn(false);
        let burned = asset_id.clone();
        ctx.fee_boundary("burn", burn_fee, move |fee| burn(&burned, 10).with_fee(fee)).await?;

        // Sponsorship: a transfer paying its fee in the asset records that fee.
        let sponsored_fee = random_amount(ctx.env().suite.max_sponsored_fee);
        let sponsor_fee = ctx.fees().sponsor;
        let sponsored = asset_id.clone();
        let sponsor = ctx
            .fee_boundary("sponsor", sponsor_fee, move |fee| {
                TransactionRequest::new(Operation::SponsorAsset {
                    asset_id: sponsored.clone(),
                    min_sponsored_asset_fee: sponsored_fee,
                })
                .with_fee(fee)
            })
            .await?;
        let sponsor = accepted_at_minimum("sponsor", sponsor)?;
        ctx.await_transaction(&sponsor.id).await?;

        let recipient = ctx.env().counterparty.address.clone();
        let transfer = TransactionRequest::new(Operation::Transfer {
            recipient,
            asset: AssetRef::Issued(asset_id.clone()),
            amount: 100,
            fee_asset: AssetRef::Issued(asset_id.clone()),
            attachment: Some("testing sponsorship".to_string()),
        })
        .with_fee(sponsored_fee)
        .with_timestamp(0);

        let step = "transfer with sponsored fee";
        let tx = ctx.required_step(step, transfer, Expectation::success()).await?;
        ctx.check(
            step,
            tx.fee == sponsored_fee,
            &format!("recorded fee {sponsored_fee}"),
            &format!("recorded fee {}", tx.fee),
        );
        ctx.check(
            step,
            tx.fee_asset == AssetRef::Issued(asset_id.clone()),
            &format!("fee paid in {asset_id}"),
            &format!("fee paid in {:?}", tx.fee_asset),
        );
        Ok(())
    })
}

pub fn smart_lifecycle(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let quantity: u64 = 10_000_000_000;
        let issue_fee = ctx.fees().issue_smart;

        ctx.step(
            "smart issue with default fee",
            issue_smart(quantity),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;

        let step = format!("smart issue @ {issue_fee}");
        let issued = ctx
            .required_step(&step, issue_smart(quantity).with_fee(issue_fee), Expectation::success())
            .await?;
        let asset_id = issued_asset(ctx, &step, &issued)?;
        let info = ctx.await_asset(&asset_id).await?;
        ctx.check(&step, info.scripted, "a scripted asset", "an asset without script");

        let reissue_fee = ctx.fees().reissue(true);
        reissue_boundary(ctx, &asset_id, reissue_fee).await?;

        let burn_fee = ctx.fees().burn(true);
        let burned = asset_id.clone();
        ctx.fee_boundary("smart burn", burn_fee, move |fee| burn(&burned, 10).with_fee(fee)).await?;

        let set_script = |asset_id: &AssetId| {
            TransactionRequest::new(Operation::SetAssetScript {
                asset_id: asset_id.clone(),
                script: ASSET_SCRIPT.to_string(),
            })
        };
        ctx.step(
            "set script with default fee",
            set_script(&asset_id),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;
        let script_fee = ctx.fees().set_asset_script;
        ctx.fee_boundary("set script", script_fee, move |fee| set_script(&asset_id).with_fee(fee))
            .await?;
        Ok(())
    })
}

pub fn nft_lifecycle(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let nft_fee = ctx.fees().issue(1, 0, false);
        let issued = ctx.fee_boundary("nft issue", nft_fee, |fee| issue_nft().with_fee(fee)).await?;
        let issued = accepted_at_minimum("nft issue", issued)?;
        let asset_id = issued_asset(ctx, "nft issue", &issued)?;
        ctx.await_asset(&asset_id).await?;

        let pair = AssetPair::against_native(asset_id.clone());
        let order_fee = ctx.fees().order;
        ctx.release_orders(&pair).await?;

        for side in [OrderSide::Sell, OrderSide::Buy] {
            ctx.place_order_scoped(
                &format!("nft {side:?} order"),
                order(&pair, side, 1, 100, Some(60_000)).with_fee(order_fee),
                Expectation::success(),
            )
            .await?;
        }

        let burn_fee = ctx.fees().burn(false);
        ctx.fee_boundary("nft burn", burn_fee, move |fee| burn(&asset_id, 1).with_fee(fee)).await?;
        Ok(())
    })
}
