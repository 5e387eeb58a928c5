use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Sha256, Sha512};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::connectors::BillingError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NONCE_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMethod {
    Sha256,
    Sha512,
}

impl SignatureMethod {
    /// Value of the `SignatureMethod` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl FromStr for SignatureMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "").as_str() {
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            other => Err(BillingError::Configuration(format!(
                "Unsupported signature method {}",
                other
            ))),
        }
    }
}

/// Headers that authenticate one signed call.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub signature_method: &'static str,
    pub signature: String,
}

/// HMAC request signer keyed by the client secret.
pub struct RequestSigner {
    client_id: String,
    client_secret: String,
    method: SignatureMethod,
}

impl RequestSigner {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        method: SignatureMethod,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            method,
        }
    }

    /// Sign with a fresh timestamp and nonce. `url` must not carry a query string.
    pub fn sign(&self, http_method: &str, url: &str) -> Result<SignedHeaders, BillingError> {
        let timestamp = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        self.sign_with(http_method, url, &timestamp, &generate_nonce())
    }

    pub fn sign_with(
        &self,
        http_method: &str,
        url: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<SignedHeaders, BillingError> {
        let string_to_sign = format!(
            "{}{}{}{}{}",
            self.client_id,
            timestamp,
            nonce,
            url,
            http_method.to_uppercase()
        );

        let signature = match self.method {
            SignatureMethod::Sha256 => self.digest::<Hmac<Sha256>>(&string_to_sign)?,
            SignatureMethod::Sha512 => self.digest::<Hmac<Sha512>>(&string_to_sign)?,
        };

        Ok(SignedHeaders {
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
            signature_method: self.method.as_str(),
            signature,
        })
    }

    fn digest<M: Mac + hmac::digest::KeyInit>(&self, message: &str) -> Result<String, BillingError> {
        let mut mac = <M as Mac>::new_from_slice(self.client_secret.as_bytes()).map_err(|err| {
            tracing::error!("error generating hmac {err:?}");
            BillingError::Configuration("Invalid HMAC key".to_string())
        })?;
        mac.update(message.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(NONCE_BYTES * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
