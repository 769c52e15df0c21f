use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::{
    constant::{
        DEFAULT_CURRENCY, DEFAULT_MATCHER_URL, DEFAULT_NODE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
        DEFAULT_SETTLEMENT_MAX_WAIT_SECS, DEFAULT_SETTLEMENT_POLL_INTERVAL_MS,
        DEFAULT_SPAM_ITERATIONS,
    },
    error::SuiteError,
    fee::FeeSchedule,
    sanitize::register_secret,
    sanitize_error,
    types::{Account, AssetId},
};

pub const NODE_URL_ENV: &str = "FEEGATE_NODE_URL";
pub const MATCHER_URL_ENV: &str = "FEEGATE_MATCHER_URL";
pub const DEFAULT_CURRENCY_ENV: &str = "FEEGATE_DEFAULT_CURRENCY";
pub const PRIMARY_SECRET_ENV: &str = "FEEGATE_PRIMARY_SECRET";
pub const COUNTERPARTY_SECRET_ENV: &str = "FEEGATE_COUNTERPARTY_SECRET";
pub const RAISE_ON_SERVICE_ERROR_ENV: &str = "FEEGATE_RAISE_ON_SERVICE_ERROR";

/// Asset traded by default in the order scenarios.
pub const DEFAULT_MARKET_ASSET: &str = "2GRJaVYhhQPKVoWQFyJfTfx3eB5DD7CPdG7ZYx3Cs6Mk";
pub const DEFAULT_MASS_TRANSFER_RECIPIENT: &str = "3XcE4knb13yyXKpdNvWhwvjrYsgMXsoicQM";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub suite: SuiteConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub node_url: String,
    pub matcher_url: String,
    pub default_currency: String,
    /// Surface service rejections as errors instead of classified results.
    pub raise_on_service_error: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            matcher_url: DEFAULT_MATCHER_URL.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            raise_on_service_error: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub address: String,
    #[serde(default)]
    pub secret: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig").field("address", &self.address).finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccountsConfig {
    pub primary: AccountConfig,
    pub counterparty: AccountConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub asset: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self { asset: DEFAULT_MARKET_ASSET.to_string() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub max_wait_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: DEFAULT_SETTLEMENT_MAX_WAIT_SECS,
            poll_interval_ms: DEFAULT_SETTLEMENT_POLL_INTERVAL_MS,
        }
    }
}

impl SettlementConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Accepted transfers submitted by the spam scenario; 0 skips it.
    pub spam_iterations: u32,
    pub mass_transfer_recipient: String,
    /// Upper bound for the random fee-in-asset used by the sponsorship check.
    pub max_sponsored_fee: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            spam_iterations: DEFAULT_SPAM_ITERATIONS,
            mass_transfer_recipient: DEFAULT_MASS_TRANSFER_RECIPIENT.to_string(),
            max_sponsored_fee: 100_000,
        }
    }
}

impl Config {
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, SuiteError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            SuiteError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                sanitize_error!(e)
            ))
        })?;

        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            SuiteError::Config(format!("Failed to parse config file: {}", sanitize_error!(e)))
        })?;

        config.apply_env_overrides();
        config.register_secrets();
        Ok(config)
    }

    /// Configuration for running the suite against the in-process ledger.
    pub fn for_simulation() -> Config {
        Config {
            service: ServiceConfig::default(),
            accounts: AccountsConfig {
                primary: AccountConfig {
                    address: "3XprimarySimulatedAccount".to_string(),
                    secret: String::new(),
                },
                counterparty: AccountConfig {
                    address: "3XcounterpartySimulatedAccount".to_string(),
                    secret: String::new(),
                },
            },
            market: MarketConfig::default(),
            settlement: SettlementConfig { max_wait_secs: 5, poll_interval_ms: 10 },
            fees: FeeSchedule::default(),
            suite: SuiteConfig::default(),
        }
    }

    /// Environment (and `.env`) values take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        dotenv::dotenv().ok();

        if let Ok(url) = std::env::var(NODE_URL_ENV) {
            self.service.node_url = url;
        }
        if let Ok(url) = std::env::var(MATCHER_URL_ENV) {
            self.service.matcher_url = url;
        }
        if let Ok(currency) = std::env::var(DEFAULT_CURRENCY_ENV) {
            self.service.default_currency = currency;
        }
        if let Ok(secret) = std::env::var(PRIMARY_SECRET_ENV) {
            self.accounts.primary.secret = secret;
        }
        if let Ok(secret) = std::env::var(COUNTERPARTY_SECRET_ENV) {
            self.accounts.counterparty.secret = secret;
        }
        if let Ok(flag) = std::env::var(RAISE_ON_SERVICE_ERROR_ENV) {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.service.raise_on_service_error = true,
                "0" | "false" | "no" => self.service.raise_on_service_error = false,
                other => {
                    tracing::warn!("Ignoring {RAISE_ON_SERVICE_ERROR_ENV}={other}: expected a boolean")
                }
            }
        }
    }

    fn register_secrets(&self) {
        register_secret(&self.accounts.primary.secret);
        register_secret(&self.accounts.counterparty.secret);
    }

    pub fn primary_account(&self) -> Account {
        Account::new("primary", &self.accounts.primary.address, &self.accounts.primary.secret)
    }

    pub fn counterparty_account(&self) -> Account {
        Account::new(
            "counterparty",
            &self.accounts.counterparty.address,
            &self.accounts.counterparty.secret,
        )
    }

    pub fn market_asset(&self) -> Result<AssetId, SuiteError> {
        self.market.asset.parse()
    }

    /// Checks everything a live run needs. `require_secrets` is false for
    /// simulated runs, which never reach the signing gateway.
    pub fn validate(&self, require_secrets: bool) -> Result<(), SuiteError> {
        for (name, url) in
            [("node_url", &self.service.node_url), ("matcher_url", &self.service.matcher_url)]
        {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| SuiteError::Config(format!("service.{name} is invalid: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SuiteError::Config(format!("service.{name} must be http(s): {url}")));
            }
        }

        if self.service.default_currency.trim().is_empty() {
            return Err(SuiteError::Config("service.default_currency is empty".to_string()));
        }

        for (label, account) in
            [("primary", &self.accounts.primary), ("counterparty", &self.accounts.counterparty)]
        {
            if account.address.trim().is_empty() {
                return Err(SuiteError::Config(format!("accounts.{label}.address is empty")));
            }
            if require_secrets && account.secret.trim().is_empty() {
                return Err(SuiteError::Config(format!(
                    "accounts.{label}.secret is empty (set it in the file or via the environment)"
                )));
            }
        }

        self.market_asset()
            .map_err(|e| SuiteError::Config(format!("market.asset is invalid: {e}")))?;

        if self.settlement.poll_interval_ms == 0 {
            return Err(SuiteError::Config("settlement.poll_interval_ms must be > 0".to_string()));
        }
        if self.settlement.poll_interval() > self.settlement.max_wait() {
            return Err(SuiteError::Config(
                "settlement.poll_interval_ms exceeds settlement.max_wait_secs".to_string(),
            ));
        }
        if self.suite.max_sponsored_fee == 0 {
            return Err(SuiteError::Config("suite.max_sponsored_fee must be > 0".to_string()));
        }

        Ok(())
    }
}
