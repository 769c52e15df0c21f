pub const NATIVE_DECIMALS: u32 = 8;
pub const DEFAULT_CURRENCY: &str = "TN";

// Fee applied by the client when a request leaves `fee` unset
pub const DEFAULT_TX_FEE: u64 = 100_000;

// HTTP Headers
pub const X_API_KEY: &str = "x-api-key";

// Network defaults
pub const DEFAULT_NODE_URL: &str = "https://apitnetworktest.blackturtle.eu";
pub const DEFAULT_MATCHER_URL: &str = "https://tntestnetmatcher.blackturtle.eu";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Settlement polling
pub const DEFAULT_SETTLEMENT_MAX_WAIT_SECS: u64 = 90;
pub const DEFAULT_SETTLEMENT_POLL_INTERVAL_MS: u64 = 2_000;

// Alias name bounds (inclusive)
pub const ALIAS_MIN_LENGTH: usize = 4;
pub const ALIAS_MAX_LENGTH: usize = 30;

// Minimum fees, in minor units of the native currency
pub mod min_fee {
    pub const TRANSFER: u64 = 2_000_000;
    pub const ALIAS_PER_CHAR: u64 = 25_000_000;
    pub const ORDER: u64 = 4_000_000;
    pub const LEASE: u64 = 2_000_000;
    pub const LEASE_CANCEL: u64 = 20_000_000;
    pub const ISSUE: u64 = 100_000_000_000;
    pub const ISSUE_NFT: u64 = 10_000_000;
    pub const ISSUE_SMART: u64 = 100_000_000_000;
    pub const REISSUE: u64 = 100_000_000_000;
    pub const BURN: u64 = 2_000_000;
    pub const SMART_ASSET_SURCHARGE: u64 = 4_000_000;
    pub const SET_ASSET_SCRIPT: u64 = 104_000_000;
    pub const SPONSOR: u64 = 1_000_000_000;
    pub const DATA_PER_KIB: u64 = 2_000_000;
    pub const MASS_TRANSFER_BASE: u64 = 2_000_000;
    pub const MASS_TRANSFER_PER_RECIPIENT: u64 = 0;
}

// Service error codes the node reports alongside a message
pub mod error_code {
    pub const INVALID_ADDRESS: i64 = 102;
    pub const INVALID_NAME: i64 = 103;
    pub const STATE_CHECK_FAILED: i64 = 112;
    pub const CUSTOM_VALIDATION: i64 = 199;
}

// Message fragments the node embeds in rejection text
pub const INSUFFICIENT_FEE_MARKER: &str = "does not exceed minimal value of";
pub const LENGTH_MARKER: &str = "length should be between";
pub const MATCHER_FEE_MARKER: &str = "as fee for this order";

pub const DEFAULT_SPAM_ITERATIONS: u32 = 0;
