use async_trait::async_trait;

use super::config::PaystackConfig;
use super::types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, StatusResult,
    TransactionResult, TvSubscriptionRequest, ValidationResult,
};
use super::{BillProvider, BillingError};
use crate::catalog::{SyncProgress, SyncReport, SyncScope};

pub const PROVIDER: &str = "paystack_bills";

/// Paystack only collects payments here; it has no bills catalog or purchase API.
pub struct PaystackBillsConnector {
    config: PaystackConfig,
}

impl PaystackBillsConnector {
    pub fn new(config: PaystackConfig) -> Self {
        tracing::debug!(base_url = %config.base_url, "paystack bills connector is collector-only");
        Self { config }
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }
}

#[async_trait]
impl BillProvider for PaystackBillsConnector {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// Nothing to sync, so every scope is as cheap as a full run.
    fn supported_scopes(&self) -> &'static [SyncScope] {
        &SyncScope::PARTIAL
    }

    async fn purchase_airtime(&self, _request: AirtimeRequest) -> Result<TransactionResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "purchase_airtime"))
    }

    async fn purchase_data(&self, _request: DataRequest) -> Result<TransactionResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "purchase_data"))
    }

    async fn pay_power_bill(&self, _request: PowerBillRequest) -> Result<TransactionResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "pay_power_bill"))
    }

    async fn pay_tv_subscription(
        &self,
        _request: TvSubscriptionRequest,
    ) -> Result<TransactionResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "pay_tv_subscription"))
    }

    async fn validate_customer(
        &self,
        _request: CustomerValidationRequest,
    ) -> Result<ValidationResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "validate_customer"))
    }

    async fn check_transaction_status(&self, _reference: &str) -> Result<StatusResult, BillingError> {
        Err(BillingError::not_implemented(PROVIDER, "check_transaction_status"))
    }

    async fn sync_catalog(&self, _progress: &dyn SyncProgress) -> Result<SyncReport, BillingError> {
        Ok(SyncReport::default())
    }
}
