use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::client::{FlutterwaveConnector, PROVIDER};
use crate::catalog::normalize::{
    listing_items, normalize_listed_biller, normalize_listed_item, CategoryRecord,
};
use crate::catalog::{SyncProgress, SyncReport, SyncRun, SyncScope};
use crate::connectors::BillingError;

const SEED_CATEGORIES: [(&str, &str); 4] = [
    ("airtime", "Airtime"),
    ("data", "Data"),
    ("electricity", "Electricity"),
    ("cable", "Cable TV"),
];

const DEFAULT_CURRENCY: &str = "NGN";

/// Upstream category codes tried in order for one scope, with the local
/// category the resulting products are filed under.
struct ScopePlan {
    scope: SyncScope,
    category_id: &'static str,
    aliases: &'static [&'static str],
    default_product_name: &'static str,
}

fn plan(scope: SyncScope) -> Option<ScopePlan> {
    let plan = match scope {
        SyncScope::Data => ScopePlan {
            scope,
            category_id: "data",
            aliases: &["DATA"],
            default_product_name: "Data Bundle",
        },
        SyncScope::Cable => ScopePlan {
            scope,
            category_id: "cable",
            aliases: &["CABLEBILLS", "CABLETV", "CABLE"],
            default_product_name: "Cable Plan",
        },
        SyncScope::Electricity => ScopePlan {
            scope,
            category_id: "electricity",
            aliases: &["ELECTRICITY", "UTILITYBILLS", "POWER"],
            default_product_name: "Electricity",
        },
        SyncScope::All => return None,
    };
    Some(plan)
}

/// Listings fetched in the current run, keyed by category code and biller code.
#[derive(Default)]
struct ListingMemo {
    billers: HashMap<String, Vec<Value>>,
    items: HashMap<String, Vec<Value>>,
    item_fetches: usize,
}

impl FlutterwaveConnector {
    pub(super) async fn sync_scopes(
        &self,
        scopes: &[SyncScope],
        progress: &dyn SyncProgress,
    ) -> Result<SyncReport, BillingError> {
        // Fail before any write when the secret is missing.
        self.ensure_configured()?;

        let mut run = SyncRun::new(PROVIDER, self.store.as_ref());
        for (id, name) in SEED_CATEGORIES {
            run.upsert_category(&CategoryRecord {
                external_id: id.to_string(),
                name: name.to_string(),
            })
            .await?;
        }

        let mut memo = ListingMemo::default();
        for plan in scopes.iter().copied().filter_map(plan) {
            self.sync_scope(&plan, &mut run, &mut memo, progress).await?;
        }

        let report = run.finish();
        tracing::info!(
            categories = report.categories,
            billers = report.billers,
            products = report.products,
            "flutterwave catalog synced"
        );
        Ok(report)
    }

    fn ensure_configured(&self) -> Result<(), BillingError> {
        match self.config().secret_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(BillingError::Configuration(
                "Flutterwave secret key is not configured".to_string(),
            )),
        }
    }

    async fn sync_scope(
        &self,
        plan: &ScopePlan,
        run: &mut SyncRun<'_>,
        memo: &mut ListingMemo,
        progress: &dyn SyncProgress,
    ) -> Result<(), BillingError> {
        let billers = self.resolve_billers(plan, memo, progress).await?;
        let forced = plan.scope.primary_flags();

        for raw in &billers {
            let Some((biller, currency)) = normalize_listed_biller(raw) else {
                continue;
            };
            run.upsert_biller_once(&biller).await?;

            let currency = currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
            let items = self.biller_items(&biller.external_id, memo, progress).await?;
            for item in &items {
                if let Some(product) = normalize_listed_item(
                    item,
                    &biller,
                    plan.category_id,
                    Some(&currency),
                    plan.default_product_name,
                ) {
                    run.upsert_product(&product, forced).await?;
                }
            }
        }
        Ok(())
    }

    /// Billers of the first alias that returns any.
    async fn resolve_billers(
        &self,
        plan: &ScopePlan,
        memo: &mut ListingMemo,
        progress: &dyn SyncProgress,
    ) -> Result<Vec<Value>, BillingError> {
        for alias in plan.aliases {
            let billers = self.billers_by_category(alias, memo, progress).await?;
            if !billers.is_empty() {
                return Ok(billers);
            }
        }
        progress.warn(&format!(
            "{}: no billers found for scope {} (tried {})",
            PROVIDER,
            plan.scope,
            plan.aliases.join(", ")
        ));
        Ok(Vec::new())
    }

    async fn billers_by_category(
        &self,
        category: &str,
        memo: &mut ListingMemo,
        progress: &dyn SyncProgress,
    ) -> Result<Vec<Value>, BillingError> {
        let key = category.to_uppercase();
        if let Some(cached) = memo.billers.get(&key) {
            return Ok(cached.clone());
        }

        let query = vec![
            ("country".to_string(), self.config().country.clone()),
            ("category".to_string(), key.clone()),
        ];
        let billers = self.fetch_listing("/billers", query).await?;
        progress.line(&format!(
            "{}: billers category={} count={}",
            PROVIDER,
            key,
            billers.len()
        ));

        memo.billers.insert(key, billers.clone());
        Ok(billers)
    }

    async fn biller_items(
        &self,
        biller_code: &str,
        memo: &mut ListingMemo,
        progress: &dyn SyncProgress,
    ) -> Result<Vec<Value>, BillingError> {
        if let Some(cached) = memo.items.get(biller_code) {
            return Ok(cached.clone());
        }

        if memo.item_fetches > 0 && self.config().item_fetch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config().item_fetch_delay_ms)).await;
        }
        memo.item_fetches += 1;

        let query = vec![
            ("country".to_string(), self.config().country.clone()),
            ("biller_code".to_string(), biller_code.to_string()),
        ];
        let items = self.fetch_listing("/bill-items", query).await?;
        progress.line(&format!(
            "{}: items biller={} count={}",
            PROVIDER,
            biller_code,
            items.len()
        ));

        memo.items.insert(biller_code.to_string(), items.clone());
        Ok(items)
    }

    /// `data[]` of a listing call; unavailable listings read as empty.
    async fn fetch_listing(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<Value>, BillingError> {
        match self.request(Method::GET, path, query, None).await {
            Ok(response) if response.is_success() => Ok(listing_items(&response.json())),
            Ok(response) => {
                tracing::warn!(status = response.status, path, "flutterwave listing failed");
                Ok(Vec::new())
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(path, "flutterwave listing failed: {}", err);
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}
