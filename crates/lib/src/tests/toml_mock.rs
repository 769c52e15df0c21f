/// TOML configuration builder for testing config file parsing
///
/// Produces a complete `feegate.toml` pointing at a local node, with hooks to
/// blank out or replace the values individual tests care about.
pub struct ConfigBuilder {
    node_url: String,
    matcher_url: String,
    primary_secret: String,
    counterparty_secret: String,
    market_asset: String,
    fees: Option<String>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            node_url: "http://127.0.0.1:6869".to_string(),
            matcher_url: "http://127.0.0.1:6886".to_string(),
            primary_secret: "primary-test-secret".to_string(),
            counterparty_secret: "counterparty-test-secret".to_string(),
            market_asset: "2GRJaVYhhQPKVoWQFyJfTfx3eB5DD7CPdG7ZYx3Cs6Mk".to_string(),
            fees: None,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_secret(mut self, secret: &str) -> Self {
        self.primary_secret = secret.to_string();
        self
    }

    pub fn with_market_asset(mut self, asset: &str) -> Self {
        self.market_asset = asset.to_string();
        self
    }

    pub fn with_fees(mut self, fees: &str) -> Self {
        self.fees = Some(fees.to_string());
        self
    }

    pub fn build_toml(&self) -> String {
        let mut toml = format!(
            r#"[service]
node_url = "{}"
matcher_url = "{}"
default_currency = "TN"
raise_on_service_error = true

[accounts.primary]
address = "3XprimaryTestAddress"
secret = "{}"

[accounts.counterparty]
address = "3XcounterpartyTestAddress"
secret = "{}"

[market]
asset = "{}"

[settlement]
max_wait_secs = 5
poll_interval_ms = 250
"#,
            self.node_url,
            self.matcher_url,
            self.primary_secret,
            self.counterparty_secret,
            self.market_asset
        );

        if let Some(fees) = &self.fees {
            toml.push_str("\n[fees]\n");
            toml.push_str(fees);
        }

        toml
    }
}

pub fn create_invalid_config() -> String {
    "[service\nnode_url = ".to_string()
}
