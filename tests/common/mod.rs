#![allow(dead_code)]

use bill_gateway::catalog::{InMemoryStore, SyncProgress};
use bill_gateway::connectors::auth::InMemoryTokenCache;
use bill_gateway::connectors::{
    FlutterwaveConfig, FlutterwaveConnector, InterswitchConfig, InterswitchConnector,
    ReqwestTransport,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/passport/oauth/token";
pub const API_PREFIX: &str = "/quicktellerservice/api/v5";

/// Interswitch config pointing both the passport and bills hosts at `server`.
pub fn interswitch_config(server: &MockServer) -> InterswitchConfig {
    InterswitchConfig {
        login_url: server.uri(),
        base_url: format!("{}{}", server.uri(), API_PREFIX),
        client_id: Some("IKIA-TEST".to_string()),
        client_secret: Some("secret".to_string()),
        terminal_id: Some("3PBL0001".to_string()),
        timeout_secs: 5,
        ..InterswitchConfig::default()
    }
}

pub fn interswitch(config: InterswitchConfig, store: Arc<InMemoryStore>) -> InterswitchConnector {
    InterswitchConnector::new(
        config,
        Arc::new(ReqwestTransport::new(5).expect("transport")),
        Arc::new(InMemoryTokenCache::new()),
        store,
    )
    .expect("Failed to build Interswitch connector")
}

/// Token grant answering `token`, expected exactly `times` times.
pub async fn mount_token(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3599
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn flutterwave_config(server: &MockServer) -> FlutterwaveConfig {
    FlutterwaveConfig {
        base_url: server.uri(),
        secret_key: Some("FLWSECK_TEST-abc".to_string()),
        timeout_secs: 5,
        item_fetch_delay_ms: 0,
        ..FlutterwaveConfig::default()
    }
}

pub fn flutterwave(config: FlutterwaveConfig, store: Arc<InMemoryStore>) -> FlutterwaveConnector {
    FlutterwaveConnector::new(
        config,
        Arc::new(ReqwestTransport::new(5).expect("transport")),
        store,
    )
}

/// Collects progress output for assertions.
#[derive(Default)]
pub struct RecordingProgress {
    pub lines: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl SyncProgress for RecordingProgress {
    fn line(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
