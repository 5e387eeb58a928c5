use async_trait::async_trait;

use crate::connectors::BillingError;
use crate::models::{BillCategory, BillProduct, BillTransaction, Biller, TransactionOutcome};

/// Whether an upsert created a row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Catalog persistence keyed by `(provider, external_id)`.
///
/// Upserts insert when absent, otherwise update the given attributes and refresh
/// the updated timestamp. Product amounts left as `None` keep their stored value.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn upsert_category(&self, category: &BillCategory) -> Result<UpsertOutcome, BillingError>;

    async fn upsert_biller(&self, biller: &Biller) -> Result<UpsertOutcome, BillingError>;

    async fn upsert_product(&self, product: &BillProduct) -> Result<UpsertOutcome, BillingError>;

    async fn list_products(&self, provider: &str) -> Result<Vec<BillProduct>, BillingError>;
}

/// Purchase audit trail keyed by the globally unique transaction reference.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Fails with `DuplicateReference` when the reference already exists.
    async fn insert_pending(&self, transaction: &BillTransaction) -> Result<(), BillingError>;

    async fn record_outcome(
        &self,
        reference: &str,
        outcome: &TransactionOutcome,
    ) -> Result<(), BillingError>;

    async fn find(&self, reference: &str) -> Result<Option<BillTransaction>, BillingError>;
}
