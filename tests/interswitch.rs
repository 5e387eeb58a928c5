mod common;

use bill_gateway::catalog::{InMemoryStore, SyncScope};
use bill_gateway::connectors::{
    AirtimeRequest, BillProvider, BillingError, CustomerValidationRequest, InterswitchConfig,
    PowerBillRequest,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::matchers::{any, body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{interswitch, interswitch_config, mount_token, RecordingProgress, API_PREFIX};

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

fn airtime(amount: &str, reference: &str) -> AirtimeRequest {
    AirtimeRequest {
        phone_number: "08031234567".to_string(),
        network: "MTN".to_string(),
        country: "NG".to_string(),
        currency: "NGN".to_string(),
        amount: Decimal::from_str(amount).unwrap(),
        product_code: Some("10902".to_string()),
        reference: Some(reference.to_string()),
        meta: Default::default(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Purchases
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_purchase_sends_minor_units_and_signed_headers() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .and(header("Authorization", "Bearer tok-1"))
        .and(header("TerminalId", "3PBL0001"))
        .and(header("SignatureMethod", "SHA256"))
        .and(header_exists("Signature"))
        .and(header_exists("Timestamp"))
        .and(header_exists("Nonce"))
        .and(body_partial_json(json!({
            "CustomerId": "08031234567",
            "PaymentCode": "10902",
            "Amount": 50000,
            "RequestReference": "ref-500"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseCode": "00",
            "ResponseDescription": "Approved",
            "TransactionRef": "ISW|LOC|001",
            "Amount": 50000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let result = isw.purchase_airtime(airtime("500.00", "ref-500")).await.unwrap();

    assert!(result.success);
    assert_eq!(result.reference, "ref-500");
    assert_eq!(result.provider, "interswitch");
    assert_eq!(result.provider_reference.as_deref(), Some("ISW|LOC|001"));
    assert_eq!(result.amount, Some(Decimal::from_str("500.00").unwrap()));
}

#[tokio::test]
async fn test_token_is_reused_across_calls() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ResponseCode": "00"})))
        .expect(2)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    assert!(isw.purchase_airtime(airtime("100", "ref-a")).await.unwrap().success);
    assert!(isw.purchase_airtime(airtime("100", "ref-b")).await.unwrap().success);
}

#[tokio::test]
async fn test_declined_purchase_is_a_failure_result() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ResponseCode": "20031",
            "ResponseDescription": "Invalid amount",
            "ResponseCodeGrouping": "FAILED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let result = isw
        .pay_power_bill(PowerBillRequest {
            meter_number: "45066000000".to_string(),
            disco: "IKEDC".to_string(),
            country: "NG".to_string(),
            currency: "NGN".to_string(),
            amount: Decimal::from(1000),
            product_code: "0101".to_string(),
            customer_name: Some("Ada".to_string()),
            reference: Some("ref-power".to_string()),
            meta: Default::default(),
        })
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error_code.as_deref(), Some("20031"));
    assert_eq!(result.message.as_deref(), Some("Invalid amount"));
}

#[tokio::test]
async fn test_unauthorized_refreshes_token_and_retries_once() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 2).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ResponseCode": "90000"})))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let result = isw.purchase_airtime(airtime("50", "ref-retry")).await.unwrap();

    assert!(result.success);
}

#[tokio::test]
async fn test_second_unauthorized_is_auth_failure() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 2).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_token"))
        .expect(2)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let err = isw
        .purchase_airtime(airtime("50", "ref-denied"))
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::AuthFailure(_)));
}

#[tokio::test]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-2"})))
        .expect(1)
        .mount(&server)
        .await;

    // Both callers hold tok-1 when their 401s land.
    Mock::given(method("GET"))
        .and(path(api("/Transactions")))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("token expired")
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/Transactions")))
        .and(header("Authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseCode": "00",
            "Status": "Complete"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let (first, second) = tokio::join!(
        isw.check_transaction_status("ref-a"),
        isw.check_transaction_status("ref-b"),
    );

    assert!(first.unwrap().success);
    assert!(second.unwrap().success);
}

#[tokio::test]
async fn test_rejected_token_grant_is_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/Transactions")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let err = isw.purchase_airtime(airtime("50", "ref-x")).await.unwrap_err();

    assert!(matches!(err, BillingError::AuthFailure(_)));
}

#[tokio::test]
async fn test_missing_secret_is_configuration_error_without_http() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = InterswitchConfig {
        client_secret: None,
        ..interswitch_config(&server)
    };
    let isw = interswitch(config, Arc::new(InMemoryStore::new()));
    let err = isw.purchase_airtime(airtime("50", "ref-x")).await.unwrap_err();

    assert!(matches!(err, BillingError::Configuration(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_a_failure_result() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    let config = InterswitchConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 1,
        ..interswitch_config(&server)
    };
    let isw = interswitch(config, Arc::new(InMemoryStore::new()));
    let result = isw.purchase_airtime(airtime("50", "ref-down")).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.reference, "ref-down");
    assert!(result.message.is_some());
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation and status
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validate_customer_reads_customer_name() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(api("/Transactions/validatecustomers")))
        .and(body_partial_json(json!({
            "customers": [{"PaymentCode": "0101", "CustomerId": "45066000000"}],
            "TerminalId": "3PBL0001"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Customers": [{
                "ResponseCode": "90000",
                "FullName": "ADA LOVELACE",
                "CustomerId": "45066000000"
            }],
            "ResponseCode": "90000",
            "CustomerName": "ADA LOVELACE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let result = isw
        .validate_customer(CustomerValidationRequest {
            customer_id: "45066000000".to_string(),
            biller_code: None,
            product_code: "0101".to_string(),
            country: None,
            meta: Default::default(),
        })
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.customer_name.as_deref(), Some("ADA LOVELACE"));
}

#[tokio::test]
async fn test_transaction_status_queries_by_reference() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(api("/Transactions")))
        .and(query_param("requestRef", "ref-777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseCode": "00",
            "Status": "Complete",
            "TransactionRef": "ISW|777",
            "Amount": 150000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let status = isw.check_transaction_status("ref-777").await.unwrap();

    assert!(status.success);
    assert_eq!(status.status, "Complete");
    assert_eq!(status.amount, Some(Decimal::from(1500)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog sync
// ─────────────────────────────────────────────────────────────────────────────

async fn mount_categories(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api("/services/categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BillerCategories": [
                {"Id": 1, "Name": "Utility Bills"},
                {"Id": 2, "Name": "Cable TV Bills"},
                {"Id": 4, "Name": "Mobile Recharge"},
                {"Id": null, "Name": "Broken"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_sync_ingests_all_services_shapes() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;
    mount_categories(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/services")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Billers": [{
                "Id": "101",
                "Name": "Ikeja Electric",
                "BillerCategoryId": "1",
                "PaymentItems": [
                    {"Id": "10101", "Name": "Prepaid Meter", "PaymentCode": "0101", "CurrencyCode": "566"},
                    {"Id": "10102", "Name": "Postpaid Meter", "PaymentCode": "0102"},
                    {"Name": "No identifier"}
                ]
            }],
            "BillerList": {
                "Category": [{
                    "Id": "4",
                    "Billers": [
                        {"Id": "201", "Name": "MTN Airtime", "ProductCode": "10902", "CurrencyCode": "566"}
                    ]
                }]
            },
            "services": [{
                "serviceid": "301",
                "name": "DStv Compact",
                "categoryid": "2",
                "billerid": "30",
                "billername": "DStv",
                "paymentCode": "0301"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let isw = interswitch(interswitch_config(&server), store.clone());
    let progress = RecordingProgress::default();

    let report = isw.sync_catalog(&progress).await.unwrap();

    assert_eq!(report.categories, 3);
    assert_eq!(report.billers, 3);
    assert_eq!(report.products, 4);
    assert!(!report.degraded);

    let products = store.products("interswitch").await;
    let prepaid = products.iter().find(|p| p.external_id == "10101").unwrap();
    assert_eq!(prepaid.payment_code.as_deref(), Some("0101"));
    assert_eq!(prepaid.biller_external_id.as_deref(), Some("101"));
    assert!(prepaid.flags.is_power);

    let mtn = products.iter().find(|p| p.external_id == "201").unwrap();
    assert_eq!(mtn.payment_code.as_deref(), Some("10902"));

    let dstv = products.iter().find(|p| p.external_id == "301").unwrap();
    assert!(dstv.flags.is_tv);

    assert_eq!(
        progress.lines(),
        vec![
            "interswitch: categories count=3".to_string(),
            "interswitch: billers count=3 products count=4".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_repeated_sync_converges() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(api("/services/categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"categoryid": "1", "categoryname": "Utility Bills"}
        ])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/services")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Services": [{"id": "301", "Name": "DStv Compact", "BillerId": "30", "BillerName": "DStv"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let isw = interswitch(interswitch_config(&server), store.clone());
    let progress = RecordingProgress::default();

    let first = isw.sync_catalog(&progress).await.unwrap();
    let second = isw.sync_catalog(&progress).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.categories("interswitch").await.len(), 1);
    assert_eq!(store.billers("interswitch").await.len(), 1);
    assert_eq!(store.products("interswitch").await.len(), 1);
}

#[tokio::test]
async fn test_failed_categories_call_aborts_sync() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(api("/services/categories")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/services")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let isw = interswitch(interswitch_config(&server), store.clone());
    let err = isw
        .sync_catalog(&RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::Upstream(_)));
    assert!(store.categories("interswitch").await.is_empty());
}

#[tokio::test]
async fn test_failed_services_call_keeps_categories() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;
    mount_categories(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/services")))
        .respond_with(ResponseTemplate::new(417).set_body_json(json!({
            "ResponseCode": "90009",
            "ResponseDescription": "Transaction pending",
            "ResponseCodeGrouping": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let isw = interswitch(interswitch_config(&server), store.clone());
    let progress = RecordingProgress::default();

    let report = isw.sync_catalog(&progress).await.unwrap();

    assert_eq!(report.categories, 3);
    assert_eq!(report.billers, 0);
    assert_eq!(report.products, 0);
    assert_eq!(store.categories("interswitch").await.len(), 3);
    assert_eq!(progress.warnings().len(), 1);
}

#[tokio::test]
async fn test_scoped_sync_degrades_to_full_sync() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;
    mount_categories(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/services")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"services": []})))
        .expect(1)
        .mount(&server)
        .await;

    let isw = interswitch(interswitch_config(&server), Arc::new(InMemoryStore::new()));
    let progress = RecordingProgress::default();

    let report = isw
        .sync_catalog_scoped(SyncScope::Data, &progress)
        .await
        .unwrap();

    assert!(report.degraded);
    assert_eq!(report.categories, 3);
    let warnings = progress.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("scoped sync [data] is not supported"));
}
