//! The scenario catalog run by `feegate run`.

mod alias;
mod asset;
mod data;
mod lease;
mod order;
mod transfer;

use rand::Rng;

use crate::{
    runner::{Scenario, ScenarioContext, ScenarioError},
    types::{AcceptedTransaction, AssetId},
};

/// Every scenario, in execution order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "transfer_default_fee",
            description: "transfer with the client default fee is rejected",
            body: transfer::default_fee,
        },
        Scenario {
            name: "transfer_fee_boundary",
            description: "transfer fee boundary",
            body: transfer::fee_boundary,
        },
        Scenario {
            name: "transfer_spam",
            description: "repeated transfers at the minimum fee are all accepted",
            body: transfer::spam,
        },
        Scenario {
            name: "alias_default_fee",
            description: "alias with the client default fee is rejected",
            body: alias::default_fee,
        },
        Scenario {
            name: "alias_length_boundary",
            description: "alias names must be 4 to 30 characters",
            body: alias::length_boundary,
        },
        Scenario {
            name: "alias_fee_boundary",
            description: "alias fee boundary for a 12 character name",
            body: alias::fee_boundary,
        },
        Scenario {
            name: "order_fee_boundary",
            description: "matcher fee boundary, cancelling after each placement",
            body: order::fee_boundary,
        },
        Scenario {
            name: "cancel_orders_idempotent",
            description: "cancel-all on an empty book succeeds",
            body: order::cancel_idempotent,
        },
        Scenario {
            name: "lease_fee_boundary",
            description: "lease fee boundary",
            body: lease::fee_boundary,
        },
        Scenario {
            name: "lease_and_cancel",
            description: "lease cancel with a low fee leaves the lease pending",
            body: lease::lease_and_cancel,
        },
        Scenario {
            name: "asset_lifecycle",
            description: "issue, reissue, burn and sponsor an asset",
            body: asset::lifecycle,
        },
        Scenario {
            name: "smart_asset_lifecycle",
            description: "smart asset issue, reissue and burn surcharges, set script",
            body: asset::smart_lifecycle,
        },
        Scenario {
            name: "data_transaction",
            description: "data transaction fee and fresh timestamped value",
            body: data::data_transaction,
        },
        Scenario {
            name: "mass_transfer_fee_boundary",
            description: "mass transfer fee boundary",
            body: transfer::mass_transfer_fee_boundary,
        },
        Scenario {
            name: "nft_lifecycle",
            description: "issue an NFT, trade it on the matcher, burn it",
            body: asset::nft_lifecycle,
        },
    ]
}

pub fn find(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.name == name)
}

/// Random lowercase ASCII string.
pub fn random_name(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length).map(|_| char::from(rng.random_range(b'a'..=b'z'))).collect()
}

pub fn random_amount(max: u64) -> u64 {
    rand::rng().random_range(1..=max.max(1))
}

/// Asset id of an accepted issue, recording a failure when it is missing.
fn issued_asset(
    ctx: &mut ScenarioContext,
    step: &str,
    tx: &AcceptedTransaction,
) -> Result<AssetId, ScenarioError> {
    match &tx.asset_id {
        Some(asset_id) => Ok(asset_id.clone()),
        None => {
            ctx.check(step, false, "an asset id", &format!("transaction {} without asset id", tx.id));
            Err(ScenarioError::Mismatch { step: step.to_string() })
        }
    }
}

/// Unwraps the accepted side of a fee boundary, failing the scenario when
/// the minimum fee was not accepted.
fn accepted_at_minimum(
    step: &str,
    tx: Option<AcceptedTransaction>,
) -> Result<AcceptedTransaction, ScenarioError> {
    tx.ok_or_else(|| ScenarioError::Mismatch { step: step.to_string() })
}
