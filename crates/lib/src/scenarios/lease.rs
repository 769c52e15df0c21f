use futures::future::BoxFuture;

use crate::{
    constant::INSUFFICIENT_FEE_MARKER,
    runner::{lifecycle::LeaseState, Expectation, ScenarioContext, ScenarioError},
    types::{Operation, TransactionRequest},
};

fn lease(recipient: &str) -> TransactionRequest {
    TransactionRequest::new(Operation::Lease { recipient: recipient.to_string(), amount: 1 })
}

fn cancel_lease(lease_id: &str) -> TransactionRequest {
    TransactionRequest::new(Operation::CancelLease { lease_id: lease_id.to_string() })
}

pub fn fee_boundary(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let recipient = ctx.env().counterparty.address.clone();
        ctx.step(
            "lease with default fee",
            lease(&recipient),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;

        let minimum = ctx.fees().lease;
        ctx.fee_boundary("lease", minimum, move |fee| lease(&recipient).with_fee(fee)).await?;
        Ok(())
    })
}

pub fn lease_and_cancel(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let recipient = ctx.env().counterparty.address.clone();
        let lease_fee = ctx.fees().lease;
        let cancel_fee = ctx.fees().lease_cancel;

        let leased = ctx
            .required_step("lease", lease(&recipient).with_fee(lease_fee), Expectation::success())
            .await?;
        ctx.await_transaction(&leased.id).await?;

        ctx.step(
            "lease cancel with default fee",
            cancel_lease(&leased.id),
            Expectation::insufficient_fee(),
        )
        .await?;
        let state = ctx.lease_state(&leased.id);
        ctx.check(
            "lease after low-fee cancel",
            state == LeaseState::Pending,
            &LeaseState::Pending.to_string(),
            &state.to_string(),
        );

        if let Some(below) = cancel_fee.checked_sub(1) {
            ctx.step(
                &format!("lease cancel @ {below}"),
                cancel_lease(&leased.id).with_fee(below),
                Expectation::insufficient_fee(),
            )
            .await?;
            let state = ctx.lease_state(&leased.id);
            ctx.check(
                &format!("lease after cancel @ {below}"),
                state == LeaseState::Pending,
                &LeaseState::Pending.to_string(),
                &state.to_string(),
            );
        }

        ctx.step(
            &format!("lease cancel @ {cancel_fee}"),
            cancel_lease(&leased.id).with_fee(cancel_fee),
            Expectation::success(),
        )
        .await?;
        let state = ctx.lease_state(&leased.id);
        ctx.check(
            "lease after cancel",
            state == LeaseState::Cancelled,
            &LeaseState::Cancelled.to_string(),
            &state.to_string(),
        );
        Ok(())
    })
}
