use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::Instrument;

use super::token_cache::{AccessToken, TokenCache};
use crate::connectors::transport::{HttpRequest, HttpTransport};
use crate::connectors::BillingError;

const TOKEN_PATH: &str = "/passport/oauth/token";

/// Client credentials for the grant; both halves are required.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn from_parts(
        provider: &str,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Self, BillingError> {
        match (non_empty(client_id), non_empty(client_secret)) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            }),
            _ => Err(BillingError::Configuration(format!(
                "{} client credentials are not configured",
                provider
            ))),
        }
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Acquires and caches bearer tokens via the client-credentials grant.
///
/// Refreshes are single-flight: concurrent callers that find the cache empty
/// queue on `refresh_lock`, and all but the first find the token already cached
/// once they get the lock.
pub struct TokenManager {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn TokenCache>,
    login_url: String,
    credentials: ClientCredentials,
    cache_key: String,
    ttl: Duration,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: Arc<dyn TokenCache>,
        login_url: &str,
        credentials: ClientCredentials,
        cache_key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            transport,
            cache,
            login_url: login_url.trim_end_matches('/').to_string(),
            credentials,
            cache_key: cache_key.into(),
            ttl,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub async fn access_token(&self) -> Result<String, BillingError> {
        if let Some(token) = self.cache.get(&self.cache_key).await? {
            return Ok(token.value);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.cache.get(&self.cache_key).await? {
            tracing::debug!("access token refreshed by a concurrent caller");
            return Ok(token.value);
        }

        let token = self.request_token().await?;
        self.cache.put(&self.cache_key, &token, self.ttl).await?;
        Ok(token.value)
    }

    /// Drop the cached token, e.g. after the upstream answered 401.
    pub async fn invalidate(&self) -> Result<(), BillingError> {
        self.cache.forget(&self.cache_key).await
    }

    /// Drop the cached token only while it is still `rejected`. A caller whose
    /// 401 arrives after a concurrent refresh keeps the fresh token.
    pub async fn invalidate_if(&self, rejected: &str) -> Result<(), BillingError> {
        let _guard = self.refresh_lock.lock().await;
        match self.cache.get(&self.cache_key).await? {
            Some(token) if token.value == rejected => self.cache.forget(&self.cache_key).await,
            Some(_) => {
                tracing::debug!("rejected access token already replaced");
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn request_token(&self) -> Result<AccessToken, BillingError> {
        let span = tracing::info_span!(
            "bills_token_grant",
            client_id = %self.credentials.client_id,
        );

        let request = HttpRequest::new(Method::POST, format!("{}{}", self.login_url, TOKEN_PATH))
            .header("Authorization", self.credentials.basic_auth())
            .header("Accept", "application/json")
            .form(vec![(
                "grant_type".to_string(),
                "client_credentials".to_string(),
            )]);

        let response = self.transport.send(request).instrument(span).await?;

        if !response.is_success() {
            tracing::error!(status = response.status, "token grant rejected");
            return Err(BillingError::AuthFailure(format!(
                "Token grant rejected with status {}",
                response.status
            )));
        }

        let value = response
            .json()
            .get("access_token")
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                BillingError::AuthFailure("Token response missing access_token".to_string())
            })?;

        tracing::info!("obtained new access token");
        Ok(AccessToken::new(value, self.ttl))
    }
}
