use futures::future::BoxFuture;

use super::accepted_at_minimum;
use crate::{
    constant::INSUFFICIENT_FEE_MARKER,
    runner::{Expectation, ScenarioContext, ScenarioError},
    types::{AssetRef, MassTransferItem, Operation, TransactionRequest},
};

fn native_transfer(recipient: &str) -> TransactionRequest {
    TransactionRequest::new(Operation::Transfer {
        recipient: recipient.to_string(),
        asset: AssetRef::Native,
        amount: 1,
        fee_asset: AssetRef::Native,
        attachment: None,
    })
}

pub fn default_fee(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let request = native_transfer(&ctx.env().primary.address);
        ctx.step("transfer with default fee", request, Expectation::insufficient_fee()).await?;
        Ok(())
    })
}

pub fn fee_boundary(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let recipient = ctx.env().primary.address.clone();
        let minimum = ctx.fees().transfer;
        ctx.fee_boundary("transfer", minimum, move |fee| native_transfer(&recipient).with_fee(fee))
            .await?;
        Ok(())
    })
}

pub fn spam(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let iterations = ctx.env().suite.spam_iterations;
        if iterations == 0 {
            return Err(ScenarioError::Skip("suite.spam_iterations is 0".to_string()));
        }

        let recipient = ctx.env().primary.address.clone();
        let fee = ctx.fees().transfer;
        for i in 1..=iterations {
            let request = native_transfer(&recipient).with_fee(fee);
            ctx.step(&format!("spam transfer {i}/{iterations}"), request, Expectation::success())
                .await?;
        }
        Ok(())
    })
}

pub fn mass_transfer_fee_boundary(
    ctx: &mut ScenarioContext,
) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let recipient = ctx.env().suite.mass_transfer_recipient.clone();
        let transfers: Vec<MassTransferItem> = (1..=3)
            .map(|amount| MassTransferItem { recipient: recipient.clone(), amount })
            .collect();
        let minimum = ctx.fees().mass_transfer(transfers.len());

        let request = move |fee| {
            TransactionRequest::new(Operation::MassTransfer {
                asset: AssetRef::Native,
                transfers: transfers.clone(),
                attachment: None,
            })
            .with_fee(fee)
        };

        ctx.step(
            &format!("mass transfer @ {}", minimum.saturating_sub(1)),
            request(minimum.saturating_sub(1)),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;

        let step = format!("mass transfer @ {minimum}");
        let tx = ctx.step(&step, request(minimum), Expectation::success()).await?;
        let tx = accepted_at_minimum(&step, tx)?;
        ctx.check(&step, !tx.id.is_empty(), "a transaction id", "an empty id");
        Ok(())
    })
}
