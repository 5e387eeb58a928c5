//! Flutterwave bills connector.
//!
//! Bearer-authenticated with the account secret key. Catalog refreshes walk
//! billers per category and their bill items, so data, cable and electricity
//! can each be refreshed on their own.

mod catalog;
mod client;

pub use client::{FlutterwaveConnector, PROVIDER};
