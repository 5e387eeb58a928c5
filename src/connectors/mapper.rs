//! Interpretation of raw provider responses into uniform results.
//!
//! Two rule families exist. Coded providers answer with a response code and a
//! grouping; success needs a 2xx status plus a known success code or the
//! `SUCCESSFUL` grouping. Uncoded providers are judged on a status word or on
//! the presence of a required field.

use rust_decimal::Decimal;
use serde_json::Value;

use super::transport::HttpResponse;
use super::types::{StatusResult, TransactionResult, ValidationResult};
use super::BillingError;
use crate::catalog::money::decimal_from_value;
use crate::catalog::normalize::pick_str;

pub const SUCCESS_CODES: &[&str] = &["00", "90000"];
pub const SUCCESS_GROUPING: &str = "SUCCESSFUL";
/// Status words an uncoded provider uses for a completed payment
pub const SUCCESS_STATUSES: &[&str] = &["success", "successful", "completed"];

/// Fields of a coded response body
#[derive(Debug, Default)]
pub struct CodedResponse {
    pub ok: bool,
    pub code: Option<String>,
    pub grouping: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub body: Value,
}

impl CodedResponse {
    pub fn parse(response: &HttpResponse) -> Self {
        let body = response.json();
        Self {
            ok: response.is_success(),
            code: pick_str(&body, &["ResponseCode"]),
            grouping: pick_str(&body, &["ResponseCodeGrouping"]),
            status: pick_str(&body, &["Status"]),
            description: pick_str(&body, &["ResponseDescription"]),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.ok
            && (self
                .code
                .as_deref()
                .map_or(false, |code| SUCCESS_CODES.contains(&code))
                || self.grouping.as_deref() == Some(SUCCESS_GROUPING))
    }

    /// Explicit status, else the grouping, else a word matching the outcome.
    pub fn status_text(&self) -> String {
        self.status
            .clone()
            .or_else(|| self.grouping.clone())
            .unwrap_or_else(|| {
                if self.is_success() {
                    "success".to_string()
                } else {
                    "failed".to_string()
                }
            })
    }

    fn provider_reference(&self) -> Option<String> {
        pick_str(&self.body, &["TransactionRef"])
    }

    /// Reported amount in minor units, converted back to caller-facing units.
    fn amount(&self) -> Option<Decimal> {
        self.body
            .get("Amount")
            .and_then(decimal_from_value)
            .map(|minor| minor / Decimal::ONE_HUNDRED)
    }
}

pub fn coded_transaction(reference: &str, provider: &str, response: &HttpResponse) -> TransactionResult {
    let coded = CodedResponse::parse(response);
    let status = coded.status_text();

    if !coded.is_success() {
        return TransactionResult::failure(
            reference,
            provider,
            status,
            Some(
                coded
                    .description
                    .clone()
                    .unwrap_or_else(|| "Bill transaction failed.".to_string()),
            ),
            coded.code.clone(),
            coded.body,
        );
    }

    TransactionResult::success(
        reference,
        provider,
        status,
        coded.provider_reference(),
        coded.amount(),
        coded.description.clone(),
        coded.body,
    )
}

pub fn coded_status(reference: &str, provider: &str, response: &HttpResponse) -> StatusResult {
    let coded = CodedResponse::parse(response);
    let status = coded.status_text();

    if !coded.is_success() {
        return StatusResult::failure(
            reference,
            provider,
            status,
            Some(
                coded
                    .description
                    .clone()
                    .unwrap_or_else(|| "Unable to retrieve transaction status.".to_string()),
            ),
            coded.code.clone(),
            coded.body,
        );
    }

    StatusResult::success(
        reference,
        provider,
        status,
        coded.provider_reference(),
        coded.amount(),
        coded.description.clone(),
        coded.body,
    )
}

pub fn coded_validation(customer_id: &str, provider: &str, response: &HttpResponse) -> ValidationResult {
    let coded = CodedResponse::parse(response);

    if !coded.is_success() {
        return ValidationResult::failure(
            customer_id,
            provider,
            Some(
                coded
                    .description
                    .clone()
                    .unwrap_or_else(|| "Customer validation failed.".to_string()),
            ),
            coded.code.clone(),
            coded.body,
        );
    }

    ValidationResult::success(
        customer_id,
        pick_str(&coded.body, &["CustomerName"]),
        provider,
        coded.description.clone(),
        coded.body,
    )
}

/// `data.status`, falling back to the top-level `status`, lowercased.
fn status_word(body: &Value) -> Option<String> {
    body.get("data")
        .and_then(|data| pick_str(data, &["status"]))
        .or_else(|| pick_str(body, &["status"]))
        .map(|s| s.to_lowercase())
}

fn is_success_word(status: Option<&str>) -> bool {
    status.map_or(false, |s| SUCCESS_STATUSES.contains(&s))
}

pub fn status_word_transaction(
    reference: &str,
    provider: &str,
    response: &HttpResponse,
) -> TransactionResult {
    let body = response.json();
    let status = status_word(&body);
    let data = body.get("data").cloned().unwrap_or(Value::Null);

    if !response.is_success() || !is_success_word(status.as_deref()) {
        return TransactionResult::failure(
            reference,
            provider,
            status.unwrap_or_else(|| "failed".to_string()),
            Some(pick_str(&body, &["message"]).unwrap_or_else(|| "Transaction failed".to_string())),
            None,
            body,
        );
    }

    TransactionResult::success(
        reference,
        provider,
        status.unwrap_or_default(),
        pick_str(&data, &["flw_ref"]),
        data.get("amount").and_then(decimal_from_value),
        pick_str(&body, &["message"]),
        body,
    )
}

pub fn status_word_status(reference: &str, provider: &str, response: &HttpResponse) -> StatusResult {
    let body = response.json();
    let status = status_word(&body);
    let data = body.get("data").cloned().unwrap_or(Value::Null);

    if !response.is_success() || !is_success_word(status.as_deref()) {
        return StatusResult::failure(
            reference,
            provider,
            status.unwrap_or_else(|| "failed".to_string()),
            Some(
                pick_str(&body, &["message"])
                    .unwrap_or_else(|| "Unable to retrieve transaction status.".to_string()),
            ),
            None,
            body,
        );
    }

    StatusResult::success(
        reference,
        provider,
        status.unwrap_or_default(),
        pick_str(&data, &["flw_ref"]),
        data.get("amount").and_then(decimal_from_value),
        pick_str(&body, &["message"]),
        body,
    )
}

/// Success iff the call succeeded and `data.<field>` is non-empty.
pub fn field_presence_validation(
    customer_id: &str,
    provider: &str,
    response: &HttpResponse,
    field: &str,
) -> ValidationResult {
    let body = response.json();
    let data = body.get("data").cloned().unwrap_or(Value::Null);
    let resolved = pick_str(&data, &[field]);

    match resolved {
        Some(resolved) if response.is_success() => ValidationResult::success(
            resolved,
            pick_str(&data, &["name"]),
            provider,
            Some(
                pick_str(&data, &["message"])
                    .unwrap_or_else(|| "Customer validated successfully".to_string()),
            ),
            data,
        ),
        _ => ValidationResult::failure(
            customer_id,
            provider,
            Some(
                pick_str(&data, &["message"])
                    .or_else(|| pick_str(&body, &["message"]))
                    .unwrap_or_else(|| "Failed to validate customer".to_string()),
            ),
            Some(pick_str(&body, &["status"]).unwrap_or_else(|| "VALIDATION_FAILED".to_string())),
            data,
        ),
    }
}

fn transport_message(err: &BillingError) -> (Option<String>, Value) {
    let message = err.to_string();
    (Some(message.clone()), serde_json::json!({ "message": message }))
}

/// Failure carrying the transport error text, for adapters that recover it.
pub fn transport_failure(reference: &str, provider: &str, err: &BillingError) -> TransactionResult {
    let (message, raw) = transport_message(err);
    TransactionResult::failure(reference, provider, "failed", message, None, raw)
}

pub fn transport_status_failure(reference: &str, provider: &str, err: &BillingError) -> StatusResult {
    let (message, raw) = transport_message(err);
    StatusResult::failure(reference, provider, "failed", message, None, raw)
}

pub fn transport_validation_failure(
    customer_id: &str,
    provider: &str,
    err: &BillingError,
) -> ValidationResult {
    let (message, raw) = transport_message(err);
    ValidationResult::failure(customer_id, provider, message, None, raw)
}
