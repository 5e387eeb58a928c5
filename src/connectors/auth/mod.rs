//! Token acquisition, caching and HMAC request signing for signed providers.

mod signer;
mod token;
mod token_cache;

pub use signer::{RequestSigner, SignatureMethod, SignedHeaders, TIMESTAMP_FORMAT};
pub use token::{ClientCredentials, TokenManager};
pub use token_cache::{AccessToken, InMemoryTokenCache, RedisTokenCache, TokenCache};
