//! Glow Donation Engine
//!
//! The donation engine turns asynchronous payment confirmations from independent payment providers (Pay.nl and
//! Payconiq) into a single, consistent, append-mostly ledger of "candle" donations per campaign, with aggregate totals
//! that are exact at all times.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). You should never need to access the database directly. Use the
//!    public API instead. The exception is the data types used in the database, defined in [`mod@db_types`].
//! 2. The engine public API ([`mod@engine_api`]): donation initiation and provider confirmation, reconciliation into
//!    the ledger, cache expiry, and the ledger read path.
//!
//! The engine also emits events (a payment was confirmed, a batch of donations was merged) that you can hook into
//! through the simple actor framework in [`mod@events`].
pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    cache_janitor::{CacheJanitor, DEFAULT_CACHE_RETENTION_HOURS},
    donation_objects,
    errors::PaymentFlowError,
    ledger_api::LedgerApi,
    payment_flow_api::{PaymentFlowApi, DEFAULT_VERIFICATION_TIMEOUT},
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CampaignManagement,
    LedgerError,
    LedgerManagement,
    PaymentCacheError,
    PaymentCacheManagement,
    PaymentProviderGateway,
    ProviderError,
};
