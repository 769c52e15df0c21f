use futures::future::BoxFuture;

use crate::{
    runner::{lifecycle::OrderState, Expectation, ScenarioContext, ScenarioError},
    types::{AssetPair, Operation, OrderSide, TransactionRequest},
};

const ORDER_AMOUNT: u64 = 100_000;
const ORDER_PRICE: u64 = 1_000_000;

pub(super) fn order(
    pair: &AssetPair,
    side: OrderSide,
    amount: u64,
    price: u64,
    max_lifetime_ms: Option<u64>,
) -> TransactionRequest {
    TransactionRequest::new(Operation::PlaceOrder {
        pair: pair.clone(),
        side,
        amount,
        price,
        max_lifetime_ms,
    })
}

pub fn fee_boundary(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let pair = ctx.env().market_pair();
        let minimum = ctx.fees().order;
        ctx.release_orders(&pair).await?;

        let below = minimum.saturating_sub(1);
        ctx.place_order_scoped(
            &format!("buy order @ {below}"),
            order(&pair, OrderSide::Buy, ORDER_AMOUNT, ORDER_PRICE, None).with_fee(below),
            Expectation::insufficient_fee().pre_submit(),
        )
        .await?;

        let step = format!("buy order @ {minimum}");
        let placed = ctx
            .place_order_scoped(
                &step,
                order(&pair, OrderSide::Buy, ORDER_AMOUNT, ORDER_PRICE, None).with_fee(minimum),
                Expectation::success(),
            )
            .await?;

        if let Some(tx) = placed {
            let state = ctx.order_state(&tx.id);
            ctx.check(
                &step,
                state == OrderState::Cancelled || state == OrderState::Filled,
                "order cancelled or filled",
                &format!("{state:?}"),
            );
        }
        Ok(())
    })
}

pub fn cancel_idempotent(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let pair = ctx.env().market_pair();
        ctx.release_orders(&pair).await?;

        for attempt in 1..=2 {
            let request = TransactionRequest::new(Operation::CancelOrders { pair: pair.clone() });
            ctx.step(&format!("cancel-all on empty book #{attempt}"), request, Expectation::success())
                .await?;
        }

        let released = ctx.release_orders(&pair).await?;
        ctx.check(
            "cancel-all after cleanup",
            released.is_empty(),
            "no cancelled orders",
            &format!("{} order(s) cancelled", released.len()),
        );
        Ok(())
    })
}
