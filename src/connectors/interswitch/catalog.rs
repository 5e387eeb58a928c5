use reqwest::Method;

use super::client::{InterswitchConnector, PROVIDER};
use crate::catalog::normalize::{category_items, normalize_category, pick_str, ServicesPayload};
use crate::catalog::{SyncProgress, SyncReport, SyncRun};
use crate::connectors::transport::{HttpResponse, RequestBody};
use crate::connectors::BillingError;
use crate::models::ProductFlags;

impl InterswitchConnector {
    /// Categories first, then every biller and product from the services
    /// listing. Only a failed categories call aborts the run.
    pub(super) async fn sync_full_catalog(
        &self,
        progress: &dyn SyncProgress,
    ) -> Result<SyncReport, BillingError> {
        let mut run = SyncRun::new(PROVIDER, self.store.as_ref());

        let categories = self.fetch_categories().await?;
        for record in category_items(&categories).iter().filter_map(normalize_category) {
            run.upsert_category(&record).await?;
        }
        progress.line(&format!(
            "{}: categories count={}",
            PROVIDER,
            run.report().categories
        ));

        let services = match self.fetch_services().await? {
            Some(body) => body,
            None => {
                progress.warn(&format!(
                    "{}: services listing unavailable, no billers or products synced",
                    PROVIDER
                ));
                return Ok(run.finish());
            }
        };

        let payload = ServicesPayload::split(&services);
        tracing::debug!(
            billers = payload.billers.len(),
            biller_list_categories = payload.biller_list_categories.len(),
            flat_services = payload.flat_services.len(),
            "services payload shapes"
        );

        for group in payload.groups() {
            run.ingest_group(&group, ProductFlags::default()).await?;
        }

        let report = run.finish();
        progress.line(&format!(
            "{}: billers count={} products count={}",
            PROVIDER, report.billers, report.products
        ));
        tracing::info!(
            categories = report.categories,
            billers = report.billers,
            products = report.products,
            "interswitch catalog synced"
        );
        Ok(report)
    }

    async fn fetch_categories(&self) -> Result<serde_json::Value, BillingError> {
        let response = self
            .signed_request(
                Method::GET,
                &self.config().endpoints.categories,
                Vec::new(),
                RequestBody::Empty,
            )
            .await
            .map_err(|err| match err {
                err if err.is_recoverable() => {
                    BillingError::Upstream(format!("Failed to fetch Interswitch service categories: {}", err))
                }
                err => err,
            })?;

        if !response.is_success() {
            tracing::error!(status = response.status, "interswitch categories call failed");
            return Err(BillingError::Upstream(format!(
                "Failed to fetch Interswitch service categories (status {})",
                response.status
            )));
        }
        Ok(response.json())
    }

    /// `None` when the listing is unavailable; some environments answer 417
    /// with a pending response code until billers are provisioned.
    async fn fetch_services(&self) -> Result<Option<serde_json::Value>, BillingError> {
        let result = self
            .signed_request(
                Method::GET,
                &self.config().endpoints.services,
                Vec::new(),
                RequestBody::Empty,
            )
            .await;

        match result {
            Ok(response) if response.is_success() => Ok(Some(response.json())),
            Ok(response) => {
                log_unavailable(&response);
                Ok(None)
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Interswitch services call failed: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn log_unavailable(response: &HttpResponse) {
    let body = response.json();
    tracing::warn!(
        status = response.status,
        response_code = ?pick_str(&body, &["ResponseCode"]),
        response_description = ?pick_str(&body, &["ResponseDescription"]),
        grouping = ?pick_str(&body, &["ResponseCodeGrouping"]),
        "interswitch services listing unavailable"
    );
}
