//! Interswitch Quickteller Bills connector.
//!
//! Signed provider: each call carries a client-credentials bearer token plus an
//! HMAC signature over client id, timestamp, nonce, URL and method. Scoped
//! catalog refreshes are not offered upstream and degrade to a full sync.

mod catalog;
mod client;

pub use client::{InterswitchConnector, PROVIDER};
