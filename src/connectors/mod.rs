//! Bill-payment provider connectors
//!
//! Every provider sits behind [`BillProvider`], so callers buy airtime, data,
//! power and TV, validate customers, query status and refresh the catalog
//! without knowing which upstream they talk to.
//!
//! ## Architecture Pattern
//!
//! 1. The contract lives in `connector.rs`, request/result shapes in `types.rs`
//! 2. One directory (or file) per provider implements it over [`HttpTransport`]
//! 3. Configuration in `config.rs`, secrets filled from the environment
//! 4. Raw responses become results in `mapper.rs` only
//!
//! ## Usage
//!
//! ```ignore
//! let gateway = BillGateway::from_config(settings.default_provider, &settings.providers, cache, store)?;
//! let provider = gateway.resolve_provider(Some("flutterwave"))?;
//! let result = provider.purchase_airtime(request).await?;
//! if !result.success {
//!     tracing::warn!("declined: {:?}", result.message);
//! }
//! ```
//!
//! ## Testing
//!
//! ```ignore
//! #[tokio::test]
//! async fn test_purchase_without_http() {
//!     let transport = Arc::new(MockTransport::new().respond(200, json!({"ResponseCode": "00"})));
//!     // Drive an adapter against scripted responses
//! }
//! ```

pub mod auth;
pub mod config;
mod connector;
pub mod errors;
pub mod flutterwave;
pub mod interswitch;
pub mod mapper;
#[cfg(test)]
pub mod mock;
pub mod paystack;
pub mod transport;
pub mod types;

pub use config::{FlutterwaveConfig, InterswitchConfig, PaystackConfig, ProvidersConfig};
pub use connector::BillProvider;
pub use errors::BillingError;
pub use flutterwave::FlutterwaveConnector;
pub use interswitch::InterswitchConnector;
pub use paystack::PaystackBillsConnector;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    AirtimeRequest, CustomerValidationRequest, DataRequest, PowerBillRequest, StatusResult,
    TransactionResult, TvSubscriptionRequest, ValidationResult,
};
