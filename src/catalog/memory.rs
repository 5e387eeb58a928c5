//! In-process store, for tests and embedders without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::store::{CatalogStore, TransactionLedger, UpsertOutcome};
use crate::connectors::BillingError;
use crate::models::{BillCategory, BillProduct, BillTransaction, Biller, TransactionOutcome};

type NaturalKey = (String, String);

#[derive(Debug, Clone)]
pub struct Row<T> {
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryStore {
    categories: RwLock<HashMap<NaturalKey, Row<BillCategory>>>,
    billers: RwLock<HashMap<NaturalKey, Row<Biller>>>,
    products: RwLock<HashMap<NaturalKey, Row<BillProduct>>>,
    transactions: RwLock<HashMap<String, BillTransaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn categories(&self, provider: &str) -> Vec<BillCategory> {
        Self::records(&self.categories, provider).await
    }

    pub async fn billers(&self, provider: &str) -> Vec<Biller> {
        Self::records(&self.billers, provider).await
    }

    pub async fn products(&self, provider: &str) -> Vec<BillProduct> {
        Self::records(&self.products, provider).await
    }

    pub async fn product(&self, provider: &str, external_id: &str) -> Option<Row<BillProduct>> {
        self.products
            .read()
            .await
            .get(&(provider.to_string(), external_id.to_string()))
            .cloned()
    }

    async fn records<T: Clone>(
        table: &RwLock<HashMap<NaturalKey, Row<T>>>,
        provider: &str,
    ) -> Vec<T> {
        let mut rows: Vec<(NaturalKey, T)> = table
            .read()
            .await
            .iter()
            .filter(|((p, _), _)| p == provider)
            .map(|(key, row)| (key.clone(), row.record.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, record)| record).collect()
    }

    async fn upsert<T>(
        table: &RwLock<HashMap<NaturalKey, Row<T>>>,
        key: NaturalKey,
        record: T,
        merge: impl FnOnce(&mut T, T),
    ) -> UpsertOutcome {
        let now = Utc::now();
        let mut rows = table.write().await;
        match rows.get_mut(&key) {
            Some(row) => {
                merge(&mut row.record, record);
                row.updated_at = now;
                UpsertOutcome::Updated
            }
            None => {
                rows.insert(
                    key,
                    Row {
                        record,
                        created_at: now,
                        updated_at: now,
                    },
                );
                UpsertOutcome::Inserted
            }
        }
    }
}

fn key(provider: &str, external_id: &str) -> NaturalKey {
    (provider.to_string(), external_id.to_string())
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn upsert_category(&self, category: &BillCategory) -> Result<UpsertOutcome, BillingError> {
        let key = key(&category.provider, &category.external_id);
        Ok(Self::upsert(&self.categories, key, category.clone(), |stored, new| *stored = new).await)
    }

    async fn upsert_biller(&self, biller: &Biller) -> Result<UpsertOutcome, BillingError> {
        let key = key(&biller.provider, &biller.external_id);
        Ok(Self::upsert(&self.billers, key, biller.clone(), |stored, new| *stored = new).await)
    }

    async fn upsert_product(&self, product: &BillProduct) -> Result<UpsertOutcome, BillingError> {
        let key = key(&product.provider, &product.external_id);
        // New rows store absent amounts as zero; updates keep what was there.
        let (amount, fee) = (product.amount_minor_units, product.fee_minor_units);
        let inserted = BillProduct {
            amount_minor_units: Some(amount.unwrap_or(0)),
            fee_minor_units: Some(fee.unwrap_or(0)),
            ..product.clone()
        };
        Ok(Self::upsert(&self.products, key, inserted, |stored, new| {
            *stored = BillProduct {
                amount_minor_units: amount.or(stored.amount_minor_units),
                fee_minor_units: fee.or(stored.fee_minor_units),
                ..new
            };
        })
        .await)
    }

    async fn list_products(&self, provider: &str) -> Result<Vec<BillProduct>, BillingError> {
        Ok(self.products(provider).await)
    }
}

#[async_trait]
impl TransactionLedger for InMemoryStore {
    async fn insert_pending(&self, transaction: &BillTransaction) -> Result<(), BillingError> {
        let mut rows = self.transactions.write().await;
        if rows.contains_key(&transaction.reference) {
            return Err(BillingError::DuplicateReference(transaction.reference.clone()));
        }
        rows.insert(transaction.reference.clone(), transaction.clone());
        Ok(())
    }

    async fn record_outcome(
        &self,
        reference: &str,
        outcome: &TransactionOutcome,
    ) -> Result<(), BillingError> {
        let mut rows = self.transactions.write().await;
        let row = rows
            .get_mut(reference)
            .ok_or_else(|| BillingError::Storage(format!("Unknown transaction {}", reference)))?;

        row.status = outcome.status.clone();
        if outcome.external_reference.is_some() {
            row.external_reference = outcome.external_reference.clone();
        }
        row.response_payload = Some(outcome.response_payload.clone());
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn find(&self, reference: &str) -> Result<Option<BillTransaction>, BillingError> {
        Ok(self.transactions.read().await.get(reference).cloned())
    }
}
