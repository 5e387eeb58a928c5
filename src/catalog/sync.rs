use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::classify::classify_product;
use super::normalize::{BillerGroup, BillerRecord, CategoryRecord, ProductRecord};
use super::store::CatalogStore;
use crate::connectors::BillingError;
use crate::models::{BillCategory, BillProduct, Biller, ProductFlags};

/// Partial catalog refresh selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncScope {
    All,
    Data,
    Cable,
    Electricity,
}

impl SyncScope {
    pub const PARTIAL: [SyncScope; 3] = [SyncScope::Data, SyncScope::Cable, SyncScope::Electricity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Data => "data",
            Self::Cable => "cable",
            Self::Electricity => "electricity",
        }
    }

    /// Flag every product synced under this scope carries regardless of keywords.
    pub fn primary_flags(&self) -> ProductFlags {
        match self {
            Self::All => ProductFlags::default(),
            Self::Data => ProductFlags {
                is_data: true,
                ..ProductFlags::default()
            },
            Self::Cable => ProductFlags {
                is_tv: true,
                ..ProductFlags::default()
            },
            Self::Electricity => ProductFlags {
                is_power: true,
                ..ProductFlags::default()
            },
        }
    }
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncScope {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "data" => Ok(Self::Data),
            "cable" => Ok(Self::Cable),
            "electricity" => Ok(Self::Electricity),
            other => Err(BillingError::InvalidRequest(format!(
                "Unknown sync scope [{}], expected all, data, cable or electricity",
                other
            ))),
        }
    }
}

/// Counts of records written by one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub categories: usize,
    pub billers: usize,
    pub products: usize,
    /// A scoped request was served by a full sync
    #[serde(default)]
    pub degraded: bool,
}

/// Operator-facing progress sink, e.g. a console.
pub trait SyncProgress: Send + Sync {
    fn line(&self, message: &str);
    fn warn(&self, message: &str);
}

pub struct NoopProgress;

impl SyncProgress for NoopProgress {
    fn line(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// Forwards progress to the tracing subscriber.
pub struct TracingProgress;

impl SyncProgress for TracingProgress {
    fn line(&self, message: &str) {
        tracing::info!(target: "bills_sync", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bills_sync", "{}", message);
    }
}

/// State of one sync run for one provider.
///
/// Billers are written once per distinct identifier; a product is only written
/// after its biller, so weak biller references never dangle.
pub struct SyncRun<'a> {
    provider: &'static str,
    store: &'a dyn CatalogStore,
    seen_billers: HashSet<String>,
    report: SyncReport,
}

impl<'a> SyncRun<'a> {
    pub fn new(provider: &'static str, store: &'a dyn CatalogStore) -> Self {
        Self {
            provider,
            store,
            seen_billers: HashSet::new(),
            report: SyncReport::default(),
        }
    }

    pub async fn upsert_category(&mut self, record: &CategoryRecord) -> Result<(), BillingError> {
        self.store
            .upsert_category(&BillCategory {
                provider: self.provider.to_string(),
                external_id: record.external_id.clone(),
                name: record.name.clone(),
            })
            .await?;
        self.report.categories += 1;
        Ok(())
    }

    /// Returns `false` when the biller was already written in this run.
    pub async fn upsert_biller_once(&mut self, record: &BillerRecord) -> Result<bool, BillingError> {
        if self.seen_billers.contains(&record.external_id) {
            return Ok(false);
        }

        self.store
            .upsert_biller(&Biller {
                provider: self.provider.to_string(),
                external_id: record.external_id.clone(),
                name: record.display_name().to_string(),
            })
            .await?;

        self.seen_billers.insert(record.external_id.clone());
        self.report.billers += 1;
        Ok(true)
    }

    pub async fn upsert_product(
        &mut self,
        record: &ProductRecord,
        forced: ProductFlags,
    ) -> Result<(), BillingError> {
        let flags = classify_product(
            Some(&record.name),
            record.biller_name.as_deref(),
            record.category_id.as_deref(),
        )
        .union(forced);

        self.store
            .upsert_product(&BillProduct {
                provider: self.provider.to_string(),
                external_id: record.external_id.clone(),
                name: record.name.clone(),
                category_external_id: record.category_id.clone(),
                biller_external_id: record.biller_id.clone(),
                payment_code: record.payment_code.clone(),
                currency_code: record.currency_code.clone(),
                amount_minor_units: record.amount_minor_units,
                fee_minor_units: record.fee_minor_units,
                flags,
            })
            .await?;

        self.report.products += 1;
        Ok(())
    }

    pub async fn ingest_group(
        &mut self,
        group: &BillerGroup,
        forced: ProductFlags,
    ) -> Result<(), BillingError> {
        if let Some(biller) = &group.biller {
            self.upsert_biller_once(biller).await?;
        }
        for product in &group.products {
            self.upsert_product(product, forced).await?;
        }
        Ok(())
    }

    pub fn report(&self) -> SyncReport {
        self.report
    }

    pub fn finish(self) -> SyncReport {
        self.report
    }
}
