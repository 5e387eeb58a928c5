use async_trait::async_trait;

use super::types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, StatusResult,
    TransactionResult, TvSubscriptionRequest, ValidationResult,
};
use super::BillingError;
use crate::catalog::{SyncProgress, SyncReport, SyncScope};

/// Uniform contract implemented by every bill-payment provider adapter.
///
/// Purchase, validation and status calls turn transport and business failures
/// into `failure` results; only configuration, authentication and unsupported
/// operations come back as `Err`.
#[async_trait]
pub trait BillProvider: Send + Sync {
    /// Router name, also the `provider` column of every stored record
    fn name(&self) -> &'static str;

    /// Partial scopes with a cheaper upstream path than a full sync
    fn supported_scopes(&self) -> &'static [SyncScope] {
        &[]
    }

    async fn purchase_airtime(&self, request: AirtimeRequest) -> Result<TransactionResult, BillingError>;

    async fn purchase_data(&self, request: DataRequest) -> Result<TransactionResult, BillingError>;

    async fn pay_power_bill(&self, request: PowerBillRequest) -> Result<TransactionResult, BillingError>;

    async fn pay_tv_subscription(
        &self,
        request: TvSubscriptionRequest,
    ) -> Result<TransactionResult, BillingError>;

    async fn validate_customer(
        &self,
        request: CustomerValidationRequest,
    ) -> Result<ValidationResult, BillingError>;

    async fn check_transaction_status(&self, reference: &str) -> Result<StatusResult, BillingError>;

    async fn sync_catalog(&self, progress: &dyn SyncProgress) -> Result<SyncReport, BillingError>;

    /// Refresh one scope of the catalog. Scopes outside `supported_scopes`
    /// fall back to a full sync, reported on `progress` and in `degraded`.
    async fn sync_catalog_scoped(
        &self,
        scope: SyncScope,
        progress: &dyn SyncProgress,
    ) -> Result<SyncReport, BillingError> {
        if scope != SyncScope::All && !self.supported_scopes().contains(&scope) {
            let message = format!(
                "{}: scoped sync [{}] is not supported, running full sync",
                self.name(),
                scope
            );
            tracing::warn!(provider = self.name(), %scope, "scoped sync degraded to full sync");
            progress.warn(&message);

            let mut report = self.sync_catalog(progress).await?;
            report.degraded = true;
            return Ok(report);
        }

        self.sync_catalog(progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::mock::MockBillProvider;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        warnings: Mutex<Vec<String>>,
    }

    impl SyncProgress for RecordingProgress {
        fn line(&self, _message: &str) {}

        fn warn(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn test_unsupported_scope_degrades_with_warning() {
        let provider = MockBillProvider::default();
        let progress = RecordingProgress::default();

        let report = provider
            .sync_catalog_scoped(SyncScope::Electricity, &progress)
            .await
            .unwrap();

        assert!(report.degraded);
        let warnings = progress.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("electricity"));
    }

    #[tokio::test]
    async fn test_full_scope_is_never_degraded() {
        let provider = MockBillProvider::default();
        let progress = RecordingProgress::default();

        let report = provider.sync_catalog_scoped(SyncScope::All, &progress).await.unwrap();

        assert!(!report.degraded);
        assert!(progress.warnings.lock().unwrap().is_empty());
    }
}
