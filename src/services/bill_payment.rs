//! Purchase flow with a transaction ledger.
//!
//! The reference is fixed and recorded as `pending` before anything is sent
//! upstream; a reference that already exists is rejected without dispatch. The
//! provider answer then updates the same row in place.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::TransactionLedger;
use crate::connectors::types::generate_reference;
use crate::connectors::{
    AirtimeRequest, BillProvider, BillingError, DataRequest, PowerBillRequest, StatusResult,
    TransactionResult, TvSubscriptionRequest,
};
use crate::gateway::BillGateway;
use crate::models::{BillTransaction, TransactionOutcome, TransactionType};

const STATUS_FAILED: &str = "failed";

/// Any of the four purchase requests
#[derive(Debug, Clone)]
pub enum Purchase {
    Airtime(AirtimeRequest),
    Data(DataRequest),
    Power(PowerBillRequest),
    Tv(TvSubscriptionRequest),
}

impl Purchase {
    pub fn kind(&self) -> TransactionType {
        match self {
            Self::Airtime(_) => TransactionType::Airtime,
            Self::Data(_) => TransactionType::Data,
            Self::Power(_) => TransactionType::Power,
            Self::Tv(_) => TransactionType::Tv,
        }
    }

    fn reference_slot(&mut self) -> &mut Option<String> {
        match self {
            Self::Airtime(r) => &mut r.reference,
            Self::Data(r) => &mut r.reference,
            Self::Power(r) => &mut r.reference,
            Self::Tv(r) => &mut r.reference,
        }
    }

    /// Keep the caller's reference or generate one, and pin it on the request.
    fn assign_reference(&mut self, provider: &str) -> String {
        let kind = self.kind();
        let slot = self.reference_slot();
        let reference = slot
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| generate_reference(provider, kind));
        *slot = Some(reference.clone());
        reference
    }

    fn payload(&self) -> Value {
        let result = match self {
            Self::Airtime(r) => serde_json::to_value(r),
            Self::Data(r) => serde_json::to_value(r),
            Self::Power(r) => serde_json::to_value(r),
            Self::Tv(r) => serde_json::to_value(r),
        };
        result.unwrap_or(Value::Null)
    }

    async fn dispatch(self, provider: &dyn BillProvider) -> Result<TransactionResult, BillingError> {
        match self {
            Self::Airtime(r) => provider.purchase_airtime(r).await,
            Self::Data(r) => provider.purchase_data(r).await,
            Self::Power(r) => provider.pay_power_bill(r).await,
            Self::Tv(r) => provider.pay_tv_subscription(r).await,
        }
    }
}

impl From<AirtimeRequest> for Purchase {
    fn from(r: AirtimeRequest) -> Self {
        Self::Airtime(r)
    }
}

impl From<DataRequest> for Purchase {
    fn from(r: DataRequest) -> Self {
        Self::Data(r)
    }
}

impl From<PowerBillRequest> for Purchase {
    fn from(r: PowerBillRequest) -> Self {
        Self::Power(r)
    }
}

impl From<TvSubscriptionRequest> for Purchase {
    fn from(r: TvSubscriptionRequest) -> Self {
        Self::Tv(r)
    }
}

pub struct BillPaymentService {
    gateway: Arc<BillGateway>,
    ledger: Arc<dyn TransactionLedger>,
}

impl BillPaymentService {
    pub fn new(gateway: Arc<BillGateway>, ledger: Arc<dyn TransactionLedger>) -> Self {
        Self { gateway, ledger }
    }

    #[tracing::instrument(name = "Bill purchase.", skip(self, purchase))]
    pub async fn purchase(
        &self,
        provider: Option<&str>,
        purchase: impl Into<Purchase>,
    ) -> Result<TransactionResult, BillingError> {
        let adapter = self.gateway.resolve_provider(provider)?;
        let mut purchase = purchase.into();
        let reference = purchase.assign_reference(adapter.name());

        let pending = BillTransaction::pending(
            reference.as_str(),
            adapter.name(),
            purchase.kind(),
            purchase.payload(),
        );
        self.ledger.insert_pending(&pending).await.map_err(|err| {
            tracing::warn!("Rejected purchase {}: {}", reference, err);
            err
        })?;

        let outcome = purchase.dispatch(adapter.as_ref()).await;
        match outcome {
            Ok(result) => {
                self.ledger
                    .record_outcome(
                        &reference,
                        &TransactionOutcome {
                            status: result.status.clone(),
                            external_reference: result.provider_reference.clone(),
                            response_payload: result.raw.clone(),
                        },
                    )
                    .await?;
                tracing::info!(
                    reference = %reference,
                    provider = adapter.name(),
                    success = result.success,
                    "purchase recorded"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::error!("Purchase {} failed: {}", reference, err);
                self.ledger
                    .record_outcome(
                        &reference,
                        &TransactionOutcome {
                            status: STATUS_FAILED.to_string(),
                            external_reference: None,
                            response_payload: json!({ "error": err.to_string() }),
                        },
                    )
                    .await?;
                Err(err)
            }
        }
    }

    /// Query upstream and bring a known ledger row up to date.
    #[tracing::instrument(name = "Bill transaction status.", skip(self))]
    pub async fn refresh_status(
        &self,
        provider: Option<&str>,
        reference: &str,
    ) -> Result<StatusResult, BillingError> {
        let adapter = self.gateway.resolve_provider(provider)?;
        let status = adapter.check_transaction_status(reference).await?;

        if self.ledger.find(reference).await?.is_some() {
            self.ledger
                .record_outcome(
                    reference,
                    &TransactionOutcome {
                        status: status.status.clone(),
                        external_reference: status.provider_reference.clone(),
                        response_payload: status.raw.clone(),
                    },
                )
                .await?;
        }
        Ok(status)
    }
}
