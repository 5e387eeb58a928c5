use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use super::types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, PurchaseOrder,
    StatusResult, TransactionResult, TvSubscriptionRequest, ValidationResult,
};
use super::{BillProvider, BillingError};
use crate::catalog::{SyncProgress, SyncReport};

/// Scripted transport: answers queued responses in order, `200 {}` once drained.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, BillingError>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, err: BillingError) -> Self {
        self.push(Err(err));
        self
    }

    fn push(&self, response: Result<HttpResponse, BillingError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BillingError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 200,
                    body: "{}".to_string(),
                })
            })
    }
}

/// Provider that approves every purchase and records what it was asked.
#[derive(Default)]
pub struct MockBillProvider {
    orders: Mutex<Vec<PurchaseOrder>>,
}

impl MockBillProvider {
    pub fn orders(&self) -> Vec<PurchaseOrder> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }

    fn approve(&self, order: PurchaseOrder) -> TransactionResult {
        let reference = order.reference_or_generate("mock");
        let amount = order.amount;
        if let Ok(mut orders) = self.orders.lock() {
            orders.push(order);
        }
        TransactionResult::success(
            reference.clone(),
            "mock",
            "success",
            Some(format!("MOCK-{}", reference)),
            Some(amount),
            Some("Approved".to_string()),
            json!({"ResponseCode": "00"}),
        )
    }
}

#[async_trait]
impl BillProvider for MockBillProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn purchase_airtime(&self, request: AirtimeRequest) -> Result<TransactionResult, BillingError> {
        Ok(self.approve(request.into()))
    }

    async fn purchase_data(&self, request: DataRequest) -> Result<TransactionResult, BillingError> {
        Ok(self.approve(request.into()))
    }

    async fn pay_power_bill(&self, request: PowerBillRequest) -> Result<TransactionResult, BillingError> {
        Ok(self.approve(request.into()))
    }

    async fn pay_tv_subscription(
        &self,
        request: TvSubscriptionRequest,
    ) -> Result<TransactionResult, BillingError> {
        Ok(self.approve(request.into()))
    }

    async fn validate_customer(
        &self,
        request: CustomerValidationRequest,
    ) -> Result<ValidationResult, BillingError> {
        Ok(ValidationResult::success(
            request.customer_id,
            Some("Mock Customer".to_string()),
            "mock",
            None,
            Value::Null,
        ))
    }

    async fn check_transaction_status(&self, reference: &str) -> Result<StatusResult, BillingError> {
        Ok(StatusResult::success(
            reference,
            "mock",
            "success",
            None,
            None,
            None,
            Value::Null,
        ))
    }

    async fn sync_catalog(&self, _progress: &dyn SyncProgress) -> Result<SyncReport, BillingError> {
        Ok(SyncReport::default())
    }
}
