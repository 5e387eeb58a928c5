use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::catalog::money::to_minor_units;
use crate::catalog::{CatalogStore, SyncProgress, SyncReport};
use crate::connectors::auth::{
    ClientCredentials, RequestSigner, SignatureMethod, TokenCache, TokenManager,
};
use crate::connectors::config::InterswitchConfig;
use crate::connectors::mapper;
use crate::connectors::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use crate::connectors::types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, PurchaseOrder,
    StatusResult, TransactionResult, TvSubscriptionRequest, ValidationResult,
};
use crate::connectors::{BillProvider, BillingError};

pub const PROVIDER: &str = "interswitch";
const TOKEN_CACHE_KEY: &str = "billing:interswitch:access_token";

struct SignedAuth {
    tokens: TokenManager,
    signer: RequestSigner,
}

/// Interswitch Quickteller Bills adapter. Every call is signed and carries a
/// cached bearer token.
pub struct InterswitchConnector {
    config: InterswitchConfig,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    pub(super) store: Arc<dyn CatalogStore>,
    auth: Option<SignedAuth>,
}

impl InterswitchConnector {
    /// Missing credentials are reported by the first call that needs them.
    pub fn new(
        config: InterswitchConfig,
        transport: Arc<dyn HttpTransport>,
        token_cache: Arc<dyn TokenCache>,
        store: Arc<dyn CatalogStore>,
    ) -> Result<Self, BillingError> {
        let method: SignatureMethod = config.signature_method.parse()?;

        let auth = ClientCredentials::from_parts(
            PROVIDER,
            config.client_id.as_deref(),
            config.client_secret.as_deref(),
        )
        .ok()
        .map(|credentials| SignedAuth {
            signer: RequestSigner::new(
                credentials.client_id.clone(),
                credentials.client_secret.clone(),
                method,
            ),
            tokens: TokenManager::new(
                transport.clone(),
                token_cache,
                &config.login_url,
                credentials,
                TOKEN_CACHE_KEY,
                Duration::from_secs(config.token_ttl_secs),
            ),
        });

        if auth.is_none() {
            tracing::warn!("Interswitch credentials are not configured; calls will fail");
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            transport,
            store,
            auth,
        })
    }

    pub(super) fn config(&self) -> &InterswitchConfig {
        &self.config
    }

    fn auth(&self) -> Result<&SignedAuth, BillingError> {
        self.auth.as_ref().ok_or_else(|| {
            BillingError::Configuration("Interswitch client credentials are not configured".to_string())
        })
    }

    fn terminal_id(&self) -> Result<&str, BillingError> {
        self.config
            .terminal_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BillingError::Configuration("Interswitch terminal id is not configured".to_string()))
    }

    /// Signed call against `base_url + path`. One 401 invalidates the cached
    /// token and retries; a second 401 is an authentication failure.
    pub(super) async fn signed_request(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> Result<HttpResponse, BillingError> {
        let auth = self.auth()?;
        let terminal_id = self.terminal_id()?;
        let url = format!("{}{}", self.base_url, path);

        let (response, token) = self
            .send_signed(auth, terminal_id, &method, &url, &query, &body)
            .await?;
        if response.status != 401 {
            return Ok(response);
        }

        tracing::warn!(url = %url, "unauthorized; refreshing access token and retrying once");
        auth.tokens.invalidate_if(&token).await?;

        let (response, token) = self
            .send_signed(auth, terminal_id, &method, &url, &query, &body)
            .await?;
        if response.status == 401 {
            auth.tokens.invalidate_if(&token).await?;
            return Err(BillingError::AuthFailure(format!(
                "Interswitch rejected the access token twice: {}",
                response.body
            )));
        }
        Ok(response)
    }

    async fn send_signed(
        &self,
        auth: &SignedAuth,
        terminal_id: &str,
        method: &Method,
        url: &str,
        query: &[(String, String)],
        body: &RequestBody,
    ) -> Result<(HttpResponse, String), BillingError> {
        let token = auth.tokens.access_token().await?;
        let signed = auth.signer.sign(method.as_str(), url)?;

        let mut request = HttpRequest::new(method.clone(), url)
            .header("Authorization", format!("Bearer {}", token))
            .header("TerminalId", terminal_id)
            .header("Timestamp", signed.timestamp)
            .header("Nonce", signed.nonce)
            .header("SignatureMethod", signed.signature_method)
            .header("Signature", signed.signature)
            .header("Accept", "application/json")
            .query(query.to_vec());
        request.body = body.clone();

        let span = tracing::info_span!("interswitch_signed_request", method = %method, url = %url);
        let response = self.transport.send(request).instrument(span).await?;
        Ok((response, token))
    }

    async fn purchase(&self, order: PurchaseOrder) -> Result<TransactionResult, BillingError> {
        let reference = order.reference_or_generate(PROVIDER);
        let payment_code = order
            .product_code
            .clone()
            .or_else(|| order.meta_str("payment_code"));
        let amount = to_minor_units(order.amount).ok_or_else(|| {
            BillingError::InvalidRequest(format!("Amount {} cannot be charged", order.amount))
        })?;

        let payload = json!({
            "CustomerId": order.customer_id,
            "PaymentCode": payment_code,
            "Amount": amount,
            "RequestReference": reference,
        });

        let span = tracing::info_span!(
            "interswitch_purchase",
            kind = %order.kind,
            reference = %reference,
        );

        let result = self
            .signed_request(
                Method::POST,
                &self.config.endpoints.purchase,
                Vec::new(),
                RequestBody::Json(payload),
            )
            .instrument(span)
            .await;

        match result {
            Ok(response) => {
                let mapped = mapper::coded_transaction(&reference, PROVIDER, &response);
                tracing::info!(
                    reference = %reference,
                    success = mapped.success,
                    status = %mapped.status,
                    "interswitch purchase mapped"
                );
                Ok(mapped)
            }
            Err(err) if err.is_recoverable() => {
                tracing::error!("Interswitch purchase {} failed: {}", reference, err);
                Ok(mapper::transport_failure(&reference, PROVIDER, &err))
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl BillProvider for InterswitchConnector {
    fn name(&self) -> &'static str {
        PROVIDER
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
        let payload = json!({
            "customers": [{
                "PaymentCode": request.product_code,
                "CustomerId": request.customer_id,
            }],
            "TerminalId": self.config.terminal_id,
        });

        let span = tracing::info_span!(
            "interswitch_validate_customer",
            customer_id = %request.customer_id,
        );
        let result = self
            .signed_request(
                Method::POST,
                &self.config.endpoints.validate_customer,
                Vec::new(),
                RequestBody::Json(payload),
            )
            .instrument(span)
            .await;

        match result {
            Ok(response) => Ok(mapper::coded_validation(&request.customer_id, PROVIDER, &response)),
            Err(err) if err.is_recoverable() => Ok(mapper::transport_validation_failure(
                &request.customer_id,
                PROVIDER,
                &err,
            )),
            Err(err) => Err(err),
        }
    }

    async fn check_transaction_status(&self, reference: &str) -> Result<StatusResult, BillingError> {
        let span = tracing::info_span!("interswitch_transaction_status", reference = %reference);
        let result = self
            .signed_request(
                Method::GET,
                &self.config.endpoints.transaction_status,
                vec![("requestRef".to_string(), reference.to_string())],
                RequestBody::Empty,
            )
            .instrument(span)
            .await;

        match result {
            Ok(response) => Ok(mapper::coded_status(reference, PROVIDER, &response)),
            Err(err) if err.is_recoverable() => {
                Ok(mapper::transport_status_failure(reference, PROVIDER, &err))
            }
            Err(err) => Err(err),
        }
    }

    async fn sync_catalog(&self, progress: &dyn SyncProgress) -> Result<SyncReport, BillingError> {
        self.sync_full_catalog(progress).await
    }
}
