use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Instrument;

use crate::catalog::{CatalogStore, SyncProgress, SyncReport, SyncScope};
use crate::connectors::config::FlutterwaveConfig;
use crate::connectors::mapper;
use crate::connectors::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::connectors::types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, PurchaseOrder,
    StatusResult, TransactionResult, TvSubscriptionRequest, ValidationResult,
};
use crate::connectors::{BillProvider, BillingError};
use crate::models::TransactionType;

pub const PROVIDER: &str = "flutterwave";

/// Flutterwave bills adapter, authenticated with the secret key as bearer token.
pub struct FlutterwaveConnector {
    config: FlutterwaveConfig,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    pub(super) store: Arc<dyn CatalogStore>,
}

impl FlutterwaveConnector {
    pub fn new(
        config: FlutterwaveConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            transport,
            store,
        }
    }

    pub(super) fn config(&self) -> &FlutterwaveConfig {
        &self.config
    }

    fn secret_key(&self) -> Result<&str, BillingError> {
        self.config
            .secret_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                BillingError::Configuration("Flutterwave secret key is not configured".to_string())
            })
    }

    pub(super) async fn request(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<HttpResponse, BillingError> {
        let secret = self.secret_key()?;
        let url = format!("{}{}", self.base_url, path);

        let mut request = HttpRequest::new(method.clone(), url.as_str())
            .header("Authorization", format!("Bearer {}", secret))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let span = tracing::info_span!("flutterwave_request", method = %method, url = %url);
        self.transport.send(request).instrument(span).await
    }

    fn country_or_default<'a>(&'a self, country: Option<&'a str>) -> &'a str {
        country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.config.country)
    }

    async fn purchase(&self, order: PurchaseOrder) -> Result<TransactionResult, BillingError> {
        let reference = order.reference_or_generate(PROVIDER);
        let meta_country = order.meta_str("country");
        let country = self.country_or_default(meta_country.as_deref().or(Some(order.country.as_str())));

        let mut payload = json!({
            "country": country,
            "customer": order.customer_id,
            "amount": amount_to_json(order.amount),
            "type": bill_type(order.kind),
            "reference": reference,
        });
        if let Some(code) = &order.product_code {
            payload["biller_code"] = Value::String(code.clone());
        }

        let span = tracing::info_span!(
            "flutterwave_purchase",
            kind = %order.kind,
            reference = %reference,
        );
        let result = self
            .request(Method::POST, "/bills", Vec::new(), Some(payload))
            .instrument(span)
            .await;

        match result {
            Ok(response) => Ok(mapper::status_word_transaction(&reference, PROVIDER, &response)),
            Err(err) if err.is_recoverable() => {
                tracing::error!("Flutterwave purchase {} failed: {}", reference, err);
                Ok(mapper::transport_failure(&reference, PROVIDER, &err))
            }
            Err(err) => Err(err),
        }
    }
}

fn bill_type(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Airtime => "AIRTIME",
        TransactionType::Data => "DATA",
        TransactionType::Power => "ELECTRICITY",
        TransactionType::Tv => "CABLE",
    }
}

/// JSON number in caller-facing units; the API does not accept strings here.
fn amount_to_json(amount: Decimal) -> Value {
    let text = amount.round_dp(2).normalize().to_string();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl BillProvider for FlutterwaveConnector {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supported_scopes(&self) -> &'static [SyncScope] {
        &SyncScope::PARTIAL
    }

    async fn purchase_airtime(&self, request: AirtimeRequest) -> Result<TransactionResult, BillingError> {
        self.purchase(request.into()).await
    }

    async fn purchase_data(&self, request: DataRequest) -> Result<TransactionResult, BillingError> {
        self.purchase(request.into()).await
    }

    async fn pay_power_bill(&self, request: PowerBillRequest) -> Result<TransactionResult, BillingError> {
        self.purchase(request.into()).await
    }

    async fn pay_tv_subscription(
        &self,
        request: TvSubscriptionRequest,
    ) -> Result<TransactionResult, BillingError> {
        self.purchase(request.into()).await
    }

    async fn validate_customer(
        &self,
        request: CustomerValidationRequest,
    ) -> Result<ValidationResult, BillingError> {
        let mut query = vec![("item_code".to_string(), request.product_code.clone())];
        if let Some(code) = request.biller_code.as_ref().filter(|c| !c.is_empty()) {
            query.push(("code".to_string(), code.clone()));
        }
        query.push(("customer".to_string(), request.customer_id.clone()));
        query.push((
            "country".to_string(),
            self.country_or_default(request.country.as_deref()).to_string(),
        ));

        let span = tracing::info_span!(
            "flutterwave_validate_customer",
            customer_id = %request.customer_id,
        );
        let result = self
            .request(Method::GET, "/bills/validate-customer", query, None)
            .instrument(span)
            .await;

        match result {
            Ok(response) => Ok(mapper::field_presence_validation(
                &request.customer_id,
                PROVIDER,
                &response,
                "customer",
            )),
            Err(err) if err.is_recoverable() => Ok(mapper::transport_validation_failure(
                &request.customer_id,
                PROVIDER,
                &err,
            )),
            Err(err) => Err(err),
        }
    }

    async fn check_transaction_status(&self, reference: &str) -> Result<StatusResult, BillingError> {
        let path = format!("/bills/{}", urlencoding::encode(reference));
        let span = tracing::info_span!("flutterwave_transaction_status", reference = %reference);

        match self.request(Method::GET, &path, Vec::new(), None).instrument(span).await {
            Ok(response) => Ok(mapper::status_word_status(reference, PROVIDER, &response)),
            Err(err) if err.is_recoverable() => {
                Ok(mapper::transport_status_failure(reference, PROVIDER, &err))
            }
            Err(err) => Err(err),
        }
    }

    async fn sync_catalog(&self, progress: &dyn SyncProgress) -> Result<SyncReport, BillingError> {
        self.sync_scopes(&SyncScope::PARTIAL, progress).await
    }

    async fn sync_catalog_scoped(
        &self,
        scope: SyncScope,
        progress: &dyn SyncProgress,
    ) -> Result<SyncReport, BillingError> {
        match scope {
            SyncScope::All => self.sync_catalog(progress).await,
            scope => self.sync_scopes(&[scope], progress).await,
        }
    }
}
