//! Local mirror of provider catalogs (categories, billers, products) and the
//! purchase ledger.
//!
//! Upstream payloads are normalised into typed records (`normalize`), classified
//! (`classify`), converted to minor units (`money`) and written through a
//! [`CatalogStore`] by a [`SyncRun`], which keeps per-run bookkeeping.

pub mod classify;
pub mod memory;
pub mod money;
pub mod normalize;
pub mod postgres;
mod store;
mod sync;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use store::{CatalogStore, TransactionLedger, UpsertOutcome};
pub use sync::{NoopProgress, SyncProgress, SyncReport, SyncRun, SyncScope, TracingProgress};
