use serde::{Deserialize, Serialize};

/// Configuration for the bill-payment provider connectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub interswitch: Option<InterswitchConfig>,
    #[serde(default)]
    pub flutterwave: Option<FlutterwaveConfig>,
    #[serde(default)]
    pub paystack_bills: Option<PaystackConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            interswitch: Some(InterswitchConfig::default()),
            flutterwave: Some(FlutterwaveConfig::default()),
            paystack_bills: Some(PaystackConfig::default()),
        }
    }
}

impl ProvidersConfig {
    /// Fill secrets that were left out of the config file from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(cfg) = self.interswitch.as_mut() {
            fill_from_env(&mut cfg.client_id, "INTERSWITCH_CLIENT_ID");
            fill_from_env(&mut cfg.client_secret, "INTERSWITCH_CLIENT_SECRET");
            fill_from_env(&mut cfg.terminal_id, "INTERSWITCH_TERMINAL_ID");
        }
        if let Some(cfg) = self.flutterwave.as_mut() {
            fill_from_env(&mut cfg.secret_key, "FLUTTERWAVE_SECRET_KEY");
        }
        if let Some(cfg) = self.paystack_bills.as_mut() {
            fill_from_env(&mut cfg.secret_key, "PAYSTACK_SECRET_KEY");
        }
        self
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().map_or(true, str::is_empty) {
        if let Ok(value) = std::env::var(var) {
            *slot = Some(value);
        }
    }
}

/// Interswitch Quickteller Bills v5 connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterswitchConfig {
    /// Passport host used for the client-credentials grant
    pub login_url: String,
    /// Base URL for the bills API
    pub base_url: String,
    /// OAuth client id (from env: INTERSWITCH_CLIENT_ID)
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret, also the HMAC key (from env: INTERSWITCH_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub terminal_id: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `SHA256` or `SHA512`
    #[serde(default = "InterswitchConfig::default_signature_method")]
    pub signature_method: String,
    /// How long an access token stays cached. Keep it below the upstream lifetime.
    #[serde(default = "InterswitchConfig::default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub endpoints: InterswitchEndpoints,
}

impl InterswitchConfig {
    fn default_signature_method() -> String {
        "SHA256".to_string()
    }

    const fn default_token_ttl_secs() -> u64 {
        50 * 60
    }
}

impl Default for InterswitchConfig {
    fn default() -> Self {
        Self {
            login_url: "https://qa.interswitchng.com".to_string(),
            base_url: "https://qa.interswitchng.com/quicktellerservice/api/v5".to_string(),
            client_id: None,
            client_secret: None,
            terminal_id: None,
            timeout_secs: default_timeout_secs(),
            signature_method: Self::default_signature_method(),
            token_ttl_secs: Self::default_token_ttl_secs(),
            endpoints: InterswitchEndpoints::default(),
        }
    }
}

/// Endpoint paths relative to `InterswitchConfig::base_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterswitchEndpoints {
    pub purchase: String,
    pub transaction_status: String,
    pub categories: String,
    pub services: String,
    pub validate_customer: String,
}

impl Default for InterswitchEndpoints {
    fn default() -> Self {
        Self {
            purchase: "/Transactions".to_string(),
            transaction_status: "/Transactions".to_string(),
            categories: "/services/categories".to_string(),
            services: "/services".to_string(),
            validate_customer: "/Transactions/validatecustomers".to_string(),
        }
    }
}

/// Flutterwave bills connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlutterwaveConfig {
    pub base_url: String,
    /// Secret key sent as bearer token (from env: FLUTTERWAVE_SECRET_KEY)
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Country sent with catalog and purchase calls when the request has none
    #[serde(default = "FlutterwaveConfig::default_country")]
    pub country: String,
    /// Pause between per-biller item fetches during catalog sync
    #[serde(default = "FlutterwaveConfig::default_item_fetch_delay_ms")]
    pub item_fetch_delay_ms: u64,
}

impl FlutterwaveConfig {
    fn default_country() -> String {
        "NG".to_string()
    }

    const fn default_item_fetch_delay_ms() -> u64 {
        150
    }
}

impl Default for FlutterwaveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.flutterwave.com/v3".to_string(),
            secret_key: None,
            timeout_secs: default_timeout_secs(),
            country: Self::default_country(),
            item_fetch_delay_ms: Self::default_item_fetch_delay_ms(),
        }
    }
}

/// Paystack is only a payment collector here; kept for routing and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackConfig {
    pub base_url: String,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}
