use futures::future::BoxFuture;

use super::random_name;
use crate::{
    constant::{ALIAS_MAX_LENGTH, ALIAS_MIN_LENGTH, INSUFFICIENT_FEE_MARKER, LENGTH_MARKER},
    runner::{Expectation, ScenarioContext, ScenarioError},
    types::{Operation, TransactionRequest},
};

fn create_alias(alias: &str) -> TransactionRequest {
    TransactionRequest::new(Operation::CreateAlias { alias: alias.to_string() })
}

pub fn default_fee(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let alias = format!("not_enough_fee{}", random_name(10));
        ctx.step(
            "alias with default fee",
            create_alias(&alias),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;
        Ok(())
    })
}

pub fn length_boundary(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let cases = [
            (ALIAS_MIN_LENGTH - 1, false),
            (ALIAS_MIN_LENGTH, true),
            (ALIAS_MAX_LENGTH, true),
            (ALIAS_MAX_LENGTH + 1, false),
            (40, false),
        ];

        for (length, valid) in cases {
            let alias = random_name(length);
            let fee = ctx.fees().alias(&alias);
            let expected = if valid {
                Expectation::success()
            } else {
                Expectation::validation_error().with_message(LENGTH_MARKER)
            };
            ctx.step(&format!("alias of length {length}"), create_alias(&alias).with_fee(fee), expected)
                .await?;
        }
        Ok(())
    })
}

pub fn fee_boundary(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let alias = random_name(12);
        let minimum = ctx.fees().alias(&alias);
        ctx.fee_boundary("alias", minimum, move |fee| create_alias(&alias).with_fee(fee)).await?;
        Ok(())
    })
}
