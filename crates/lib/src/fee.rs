use serde::{Deserialize, Serialize};

use crate::{
    constant::min_fee,
    types::{DataEntry, Operation, TransactionRequest},
};

const KIB: usize = 1024;

/// Minimum fee per operation, in minor units of the native currency.
///
/// Defaults match the test network; every field can be overridden from the
/// `[fees]` table of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub transfer: u64,
    pub alias_per_char: u64,
    pub order: u64,
    pub lease: u64,
    pub lease_cancel: u64,
    pub issue: u64,
    pub issue_nft: u64,
    pub issue_smart: u64,
    pub reissue: u64,
    pub burn: u64,
    pub smart_asset_surcharge: u64,
    pub set_asset_script: u64,
    pub sponsor: u64,
    pub data_per_kib: u64,
    pub mass_transfer_base: u64,
    pub mass_transfer_per_recipient: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            transfer: min_fee::TRANSFER,
            alias_per_char: min_fee::ALIAS_PER_CHAR,
            order: min_fee::ORDER,
            lease: min_fee::LEASE,
            lease_cancel: min_fee::LEASE_CANCEL,
            issue: min_fee::ISSUE,
            issue_nft: min_fee::ISSUE_NFT,
            issue_smart: min_fee::ISSUE_SMART,
            reissue: min_fee::REISSUE,
            burn: min_fee::BURN,
            smart_asset_surcharge: min_fee::SMART_ASSET_SURCHARGE,
            set_asset_script: min_fee::SET_ASSET_SCRIPT,
            sponsor: min_fee::SPONSOR,
            data_per_kib: min_fee::DATA_PER_KIB,
            mass_transfer_base: min_fee::MASS_TRANSFER_BASE,
            mass_transfer_per_recipient: min_fee::MASS_TRANSFER_PER_RECIPIENT,
        }
    }
}

impl FeeSchedule {
    pub fn alias(&self, alias: &str) -> u64 {
        self.alias_per_char.saturating_mul(alias.chars().count() as u64)
    }

    /// Unique tokens (quantity 1, no decimals, not reissuable) use the NFT fee.
    pub fn issue(&self, quantity: u64, decimals: u8, reissuable: bool) -> u64 {
        if quantity == 1 && decimals == 0 && !reissuable {
            self.issue_nft
        } else {
            self.issue
        }
    }

    pub fn reissue(&self, scripted: bool) -> u64 {
        self.reissue + self.surcharge(scripted)
    }

    pub fn burn(&self, scripted: bool) -> u64 {
        self.burn + self.surcharge(scripted)
    }

    /// Charged per started KiB of encoded entries.
    pub fn data(&self, entries: &[DataEntry]) -> u64 {
        let bytes: usize = entries.iter().map(DataEntry::encoded_len).sum();
        let kib = bytes.div_ceil(KIB).max(1) as u64;
        self.data_per_kib.saturating_mul(kib)
    }

    pub fn mass_transfer(&self, recipients: usize) -> u64 {
        self.mass_transfer_base
            .saturating_add(self.mass_transfer_per_recipient.saturating_mul(recipients as u64))
    }

    fn surcharge(&self, scripted: bool) -> u64 {
        if scripted {
            self.smart_asset_surcharge
        } else {
            0
        }
    }

    /// Minimum native fee the service enforces for `request`.
    ///
    /// `scripted_asset` tells whether the asset the request touches carries a
    /// script; it only matters for reissue and burn.
    pub fn minimum_for(&self, request: &TransactionRequest, scripted_asset: bool) -> u64 {
        match &request.operation {
            Operation::Transfer { .. } => self.transfer,
            Operation::CreateAlias { alias } => self.alias(alias),
            Operation::PlaceOrder { .. } => self.order,
            Operation::CancelOrders { .. } => 0,
            Operation::Lease { .. } => self.lease,
            Operation::CancelLease { .. } => self.lease_cancel,
            Operation::IssueAsset { quantity, decimals, reissuable, .. } => {
                self.issue(*quantity, *decimals, *reissuable)
            }
            Operation::IssueSmartAsset { .. } => self.issue_smart,
            Operation::ReissueAsset { .. } => self.reissue(scripted_asset),
            Operation::BurnAsset { .. } => self.burn(scripted_asset),
            Operation::SetAssetScript { .. } => self.set_asset_script,
            Operation::SponsorAsset { .. } => self.sponsor,
            Operation::Data { entries } => self.data(entries),
            Operation::MassTransfer { transfers, .. } => self.mass_transfer(transfers.len()),
        }
    }
}
