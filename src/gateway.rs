//! Resolves provider adapters by name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::connectors::auth::TokenCache;
use crate::connectors::{
    flutterwave, interswitch, paystack, BillProvider, BillingError, FlutterwaveConnector,
    InterswitchConnector, PaystackBillsConnector, ProvidersConfig, ReqwestTransport,
};

pub const KNOWN_PROVIDERS: [&str; 3] = [interswitch::PROVIDER, flutterwave::PROVIDER, paystack::PROVIDER];

/// Canonical router name for `name`, accepting the short `paystack` alias.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "interswitch" => Some(interswitch::PROVIDER),
        "flutterwave" => Some(flutterwave::PROVIDER),
        "paystack_bills" | "paystack" => Some(paystack::PROVIDER),
        _ => None,
    }
}

pub struct BillGateway {
    default_provider: String,
    providers: HashMap<&'static str, Arc<dyn BillProvider>>,
}

impl BillGateway {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            default_provider: default_provider.into(),
            providers: HashMap::new(),
        }
    }

    pub fn register(mut self, provider: Arc<dyn BillProvider>) -> Self {
        self.providers.insert(provider.name(), provider);
        self
    }

    /// Build one adapter per configured provider, each with its own HTTP
    /// client and timeout.
    pub fn from_config(
        default_provider: impl Into<String>,
        config: &ProvidersConfig,
        token_cache: Arc<dyn TokenCache>,
        store: Arc<dyn CatalogStore>,
    ) -> Result<Self, BillingError> {
        let mut gateway = Self::new(default_provider);

        if let Some(cfg) = config.interswitch.clone() {
            let transport = Arc::new(ReqwestTransport::new(cfg.timeout_secs)?);
            let connector = InterswitchConnector::new(cfg, transport, token_cache, store.clone())?;
            gateway = gateway.register(Arc::new(connector));
        }

        if let Some(cfg) = config.flutterwave.clone() {
            let transport = Arc::new(ReqwestTransport::new(cfg.timeout_secs)?);
            gateway = gateway.register(Arc::new(FlutterwaveConnector::new(cfg, transport, store)));
        }

        if let Some(cfg) = config.paystack_bills.clone() {
            gateway = gateway.register(Arc::new(PaystackBillsConnector::new(cfg)));
        }

        tracing::info!(
            default = %gateway.default_provider,
            providers = ?gateway.provider_names(),
            "bill gateway initialised"
        );
        Ok(gateway)
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// The named adapter, or the default one when `name` is `None` or blank.
    pub fn resolve_provider(&self, name: Option<&str>) -> Result<Arc<dyn BillProvider>, BillingError> {
        let requested = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.default_provider.as_str());

        if let Some(provider) = self.providers.get(requested) {
            return Ok(provider.clone());
        }

        let canonical = canonical_name(requested)
            .ok_or_else(|| BillingError::UnknownProvider(requested.to_string()))?;
        self.providers.get(canonical).cloned().ok_or_else(|| {
            BillingError::Configuration(format!("Billing provider [{}] is not configured", canonical))
        })
    }
}
