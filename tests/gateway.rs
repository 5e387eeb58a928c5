mod common;

use bill_gateway::catalog::{InMemoryStore, SyncScope, TransactionLedger};
use bill_gateway::connectors::auth::InMemoryTokenCache;
use bill_gateway::connectors::{
    AirtimeRequest, BillingError, CustomerValidationRequest, DataRequest, ProvidersConfig,
};
use bill_gateway::gateway::BillGateway;
use bill_gateway::services::BillPaymentService;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{flutterwave_config, RecordingProgress};

fn gateway(config: &ProvidersConfig, store: Arc<InMemoryStore>) -> BillGateway {
    BillGateway::from_config(
        "flutterwave",
        config,
        Arc::new(InMemoryTokenCache::new()),
        store,
    )
    .expect("Failed to build gateway")
}

fn data_bundle(reference: Option<&str>) -> DataRequest {
    DataRequest {
        phone_number: "08031234567".to_string(),
        network: "MTN".to_string(),
        country: "NG".to_string(),
        currency: "NGN".to_string(),
        amount: Decimal::from(300),
        product_code: "BIL108".to_string(),
        reference: reference.map(str::to_string),
        meta: Default::default(),
    }
}

#[test]
fn test_default_provider_and_aliases() {
    let gw = gateway(&ProvidersConfig::default(), Arc::new(InMemoryStore::new()));

    assert_eq!(gw.default_provider(), "flutterwave");
    assert_eq!(gw.resolve_provider(None).unwrap().name(), "flutterwave");
    assert_eq!(gw.resolve_provider(Some("Interswitch")).unwrap().name(), "interswitch");
    assert_eq!(gw.resolve_provider(Some("paystack")).unwrap().name(), "paystack_bills");
    assert!(matches!(
        gw.resolve_provider(Some("remita")),
        Err(BillingError::UnknownProvider(_))
    ));
}

#[tokio::test]
async fn test_paystack_operations_are_not_implemented() {
    let gw = gateway(&ProvidersConfig::default(), Arc::new(InMemoryStore::new()));
    let paystack = gw.resolve_provider(Some("paystack_bills")).unwrap();

    let err = paystack
        .purchase_airtime(AirtimeRequest {
            phone_number: "08031234567".to_string(),
            network: "MTN".to_string(),
            country: "NG".to_string(),
            currency: "NGN".to_string(),
            amount: Decimal::from(100),
            product_code: None,
            reference: None,
            meta: Default::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::NotImplemented { provider: "paystack_bills", .. }
    ));

    let err = paystack
        .validate_customer(CustomerValidationRequest {
            customer_id: "0803".to_string(),
            biller_code: None,
            product_code: "x".to_string(),
            country: None,
            meta: Default::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::NotImplemented { .. }));

    let progress = RecordingProgress::default();
    let report = paystack
        .sync_catalog_scoped(SyncScope::Cable, &progress)
        .await
        .unwrap();
    assert_eq!((report.categories, report.billers, report.products), (0, 0, 0));
    assert!(!report.degraded);
    assert!(progress.warnings().is_empty());
}

#[tokio::test]
async fn test_purchase_is_recorded_in_ledger() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Bill payment successful",
            "data": {"flw_ref": "BPUSSD9", "amount": 300}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let config = ProvidersConfig {
        flutterwave: Some(flutterwave_config(&server)),
        ..ProvidersConfig::default()
    };
    let service = BillPaymentService::new(Arc::new(gateway(&config, store.clone())), store.clone());

    let result = service.purchase(None, data_bundle(Some("ord-1"))).await.unwrap();
    assert!(result.success);

    let row = store.find("ord-1").await.unwrap().unwrap();
    assert_eq!(row.provider, "flutterwave");
    assert_eq!(row.status, "success");
    assert_eq!(row.external_reference.as_deref(), Some("BPUSSD9"));
    assert_eq!(row.response_payload.unwrap()["data"]["flw_ref"], "BPUSSD9");
}

#[tokio::test]
async fn test_duplicate_reference_never_reaches_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let config = ProvidersConfig {
        flutterwave: Some(flutterwave_config(&server)),
        ..ProvidersConfig::default()
    };
    let service = BillPaymentService::new(Arc::new(gateway(&config, store.clone())), store.clone());

    service.purchase(None, data_bundle(Some("ord-2"))).await.unwrap();
    let err = service
        .purchase(None, data_bundle(Some("ord-2")))
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::DuplicateReference(_)));
}

#[tokio::test]
async fn test_configuration_error_marks_ledger_row_failed() {
    let store = Arc::new(InMemoryStore::new());
    let service = BillPaymentService::new(
        Arc::new(gateway(&ProvidersConfig::default(), store.clone())),
        store.clone(),
    );

    let err = service
        .purchase(None, data_bundle(Some("ord-3")))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Configuration(_)));

    let row = store.find("ord-3").await.unwrap().unwrap();
    assert_eq!(row.status, "failed");
    assert!(row.response_payload.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("secret key"));
}
