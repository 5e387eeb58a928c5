use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Airtime,
    Data,
    Power,
    Tv,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airtime => "airtime",
            Self::Data => "data",
            Self::Power => "power",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit row for one purchase. Created `pending` before dispatch, updated in place, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillTransaction {
    pub reference: String,
    pub external_reference: Option<String>,
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: String,
    pub request_payload: Option<serde_json::Value>,
    pub response_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillTransaction {
    pub fn pending(
        reference: impl Into<String>,
        provider: impl Into<String>,
        kind: TransactionType,
        request_payload: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            reference: reference.into(),
            external_reference: None,
            provider: provider.into(),
            kind,
            status: STATUS_PENDING.to_string(),
            request_payload: Some(request_payload),
            response_payload: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Provider answer recorded against a pending transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub status: String,
    pub external_reference: Option<String>,
    pub response_payload: serde_json::Value,
}
