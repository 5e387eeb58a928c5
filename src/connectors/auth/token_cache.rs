use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::connectors::BillingError;

/// Bearer token owned by the auth module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());
        Self {
            value: value.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[async_trait]
pub trait TokenCache: Send + Sync {
    /// A live token stored under `key`; expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<AccessToken>, BillingError>;
    async fn put(&self, key: &str, token: &AccessToken, ttl: Duration) -> Result<(), BillingError>;
    async fn forget(&self, key: &str) -> Result<(), BillingError>;
}

#[derive(Default)]
pub struct InMemoryTokenCache {
    entries: RwLock<HashMap<String, AccessToken>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<AccessToken>, BillingError> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|token| !token.is_expired())
            .cloned())
    }

    async fn put(&self, key: &str, token: &AccessToken, _ttl: Duration) -> Result<(), BillingError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), token.clone());
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), BillingError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Shares tokens between processes; entries expire server-side through `SET EX`.
#[derive(Clone)]
pub struct RedisTokenCache {
    connection: Arc<Mutex<ConnectionManager>>,
}

impl RedisTokenCache {
    pub async fn new(redis_url: &str) -> Result<Self, BillingError> {
        let client = redis::Client::open(redis_url).map_err(|err| {
            BillingError::Configuration(format!("Invalid Redis URL for token cache: {}", err))
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| BillingError::Storage(format!("Redis unavailable: {}", err)))?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn get(&self, key: &str) -> Result<Option<AccessToken>, BillingError> {
        let mut conn = self.connection.lock().await;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|err| BillingError::Storage(format!("Redis GET failed: {}", err)))?;

        match value {
            Some(payload) if !payload.is_empty() => {
                let token: AccessToken = serde_json::from_str(&payload)
                    .map_err(|err| BillingError::Storage(format!("Token decode failed: {}", err)))?;
                Ok((!token.is_expired()).then_some(token))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &str, token: &AccessToken, ttl: Duration) -> Result<(), BillingError> {
        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 {
            return Ok(());
        }

        let payload = serde_json::to_string(token)
            .map_err(|err| BillingError::Storage(format!("Token encode failed: {}", err)))?;

        let mut conn = self.connection.lock().await;
        let (): () = conn
            .set_ex(key, payload, ttl_secs)
            .await
            .map_err(|err| BillingError::Storage(format!("Redis SET failed: {}", err)))?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), BillingError> {
        let mut conn = self.connection.lock().await;
        let (): () = conn
            .del(key)
            .await
            .map_err(|err| BillingError::Storage(format!("Redis DEL failed: {}", err)))?;
        Ok(())
    }
}
