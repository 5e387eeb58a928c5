use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::TransactionType;

pub type Meta = HashMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtimeRequest {
    pub phone_number: String,
    pub network: String,
    pub country: String,
    pub currency: String,
    /// Caller-facing units, e.g. naira
    pub amount: Decimal,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRequest {
    pub phone_number: String,
    pub network: String,
    pub country: String,
    pub currency: String,
    pub amount: Decimal,
    pub product_code: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBillRequest {
    pub meter_number: String,
    pub disco: String,
    pub country: String,
    pub currency: String,
    pub amount: Decimal,
    pub product_code: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvSubscriptionRequest {
    pub smartcard_number: String,
    pub provider: String,
    pub country: String,
    pub currency: String,
    pub amount: Decimal,
    pub product_code: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerValidationRequest {
    /// Phone, meter or smartcard number
    pub customer_id: String,
    #[serde(default)]
    pub biller_code: Option<String>,
    pub product_code: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub meta: Meta,
}

/// Provider-neutral purchase, built from any of the typed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub kind: TransactionType,
    /// Phone, meter or smartcard number
    pub customer_id: String,
    /// Network, disco or TV provider code
    pub service_code: String,
    pub country: String,
    pub currency: String,
    pub amount: Decimal,
    pub product_code: Option<String>,
    pub reference: Option<String>,
    pub meta: Meta,
}

impl From<AirtimeRequest> for PurchaseOrder {
    fn from(r: AirtimeRequest) -> Self {
        Self {
            kind: TransactionType::Airtime,
            customer_id: r.phone_number,
            service_code: r.network,
            country: r.country,
            currency: r.currency,
            amount: r.amount,
            product_code: r.product_code,
            reference: r.reference,
            meta: r.meta,
        }
    }
}

impl From<DataRequest> for PurchaseOrder {
    fn from(r: DataRequest) -> Self {
        Self {
            kind: TransactionType::Data,
            customer_id: r.phone_number,
            service_code: r.network,
            country: r.country,
            currency: r.currency,
            amount: r.amount,
            product_code: Some(r.product_code),
            reference: r.reference,
            meta: r.meta,
        }
    }
}

impl From<PowerBillRequest> for PurchaseOrder {
    fn from(r: PowerBillRequest) -> Self {
        let mut meta = r.meta;
        if let Some(name) = r.customer_name {
            meta.entry("customer_name".to_string()).or_insert(Value::String(name));
        }
        Self {
            kind: TransactionType::Power,
            customer_id: r.meter_number,
            service_code: r.disco,
            country: r.country,
            currency: r.currency,
            amount: r.amount,
            product_code: Some(r.product_code),
            reference: r.reference,
            meta,
        }
    }
}

impl From<TvSubscriptionRequest> for PurchaseOrder {
    fn from(r: TvSubscriptionRequest) -> Self {
        let mut meta = r.meta;
        if let Some(name) = r.customer_name {
            meta.entry("customer_name".to_string()).or_insert(Value::String(name));
        }
        Self {
            kind: TransactionType::Tv,
            customer_id: r.smartcard_number,
            service_code: r.provider,
            country: r.country,
            currency: r.currency,
            amount: r.amount,
            product_code: Some(r.product_code),
            reference: r.reference,
            meta,
        }
    }
}

impl PurchaseOrder {
    /// Caller-supplied reference, or `<provider>_<kind>_<uuid>`.
    pub fn reference_or_generate(&self, provider: &str) -> String {
        self.reference
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| generate_reference(provider, self.kind))
    }

    pub fn meta_str(&self, key: &str) -> Option<String> {
        self.meta.get(key).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

pub fn generate_reference(provider: &str, kind: TransactionType) -> String {
    format!("{}_{}_{}", provider, kind, uuid::Uuid::new_v4().simple())
}

/// Uniform outcome of a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub success: bool,
    pub status: String,
    pub reference: String,
    pub provider_reference: Option<String>,
    /// Caller-facing units
    pub amount: Option<Decimal>,
    pub provider: String,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub raw: Value,
}

impl TransactionResult {
    pub fn success(
        reference: impl Into<String>,
        provider: &str,
        status: impl Into<String>,
        provider_reference: Option<String>,
        amount: Option<Decimal>,
        message: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: true,
            status: status.into(),
            reference: reference.into(),
            provider_reference,
            amount,
            provider: provider.to_string(),
            message,
            error_code: None,
            raw,
        }
    }

    pub fn failure(
        reference: impl Into<String>,
        provider: &str,
        status: impl Into<String>,
        message: Option<String>,
        error_code: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: false,
            status: status.into(),
            reference: reference.into(),
            provider_reference: None,
            amount: None,
            provider: provider.to_string(),
            message,
            error_code,
            raw,
        }
    }
}

/// Uniform outcome of a status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    pub success: bool,
    pub status: String,
    pub reference: String,
    pub provider_reference: Option<String>,
    pub amount: Option<Decimal>,
    pub provider: String,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub raw: Value,
}

impl StatusResult {
    pub fn success(
        reference: impl Into<String>,
        provider: &str,
        status: impl Into<String>,
        provider_reference: Option<String>,
        amount: Option<Decimal>,
        message: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: true,
            status: status.into(),
            reference: reference.into(),
            provider_reference,
            amount,
            provider: provider.to_string(),
            message,
            error_code: None,
            raw,
        }
    }

    pub fn failure(
        reference: impl Into<String>,
        provider: &str,
        status: impl Into<String>,
        message: Option<String>,
        error_code: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: false,
            status: status.into(),
            reference: reference.into(),
            provider_reference: None,
            amount: None,
            provider: provider.to_string(),
            message,
            error_code,
            raw,
        }
    }
}

/// Uniform outcome of a customer lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub provider: String,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub raw: Value,
}

impl ValidationResult {
    pub fn success(
        customer_id: impl Into<String>,
        customer_name: Option<String>,
        provider: &str,
        message: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: true,
            customer_id: customer_id.into(),
            customer_name,
            provider: provider.to_string(),
            message,
            error_code: None,
            raw,
        }
    }

    pub fn failure(
        customer_id: impl Into<String>,
        provider: &str,
        message: Option<String>,
        error_code: Option<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: false,
            customer_id: customer_id.into(),
            customer_name: None,
            provider: provider.to_string(),
            message,
            error_code,
            raw,
        }
    }
}
