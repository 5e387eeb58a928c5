//! Inbound provider notifications.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::money::decimal_from_value;
use crate::catalog::normalize::{pick, pick_str};
use crate::connectors::interswitch;

/// Provider-neutral view of a callback payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub provider: &'static str,
    pub reference: Option<String>,
    pub provider_reference: Option<String>,
    pub status: Option<String>,
    /// As sent by the provider, not rescaled
    pub amount: Option<Decimal>,
    pub raw: Value,
}

/// Normalise an Interswitch callback.
///
/// The payload signature is not verified yet, so callers must not treat the
/// event as proof of payment without a status query.
pub fn normalize_interswitch(payload: Value) -> WebhookEvent {
    // TODO: verify the callback signature against a configured webhook secret.
    tracing::warn!(
        provider = interswitch::PROVIDER,
        "webhook signature is not verified"
    );
    tracing::info!(payload = %payload, "Interswitch webhook received");

    WebhookEvent {
        provider: interswitch::PROVIDER,
        reference: pick_str(&payload, &["reference", "terminalTransactionId"]),
        provider_reference: pick_str(&payload, &["provider_reference", "transactionRef"]),
        status: pick_str(&payload, &["status", "responseCode"]),
        amount: pick(&payload, &["amount"]).and_then(decimal_from_value),
        raw: payload,
    }
}
