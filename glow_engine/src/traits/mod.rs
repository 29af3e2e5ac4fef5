//! # Backend contracts
//!
//! This module defines the behaviour that storage backends and payment provider integrations must expose in order to
//! drive the donation engine.
//!
//! ## Storage
//! * [`PaymentCacheManagement`] owns the payment cache and the cache-to-confirmed transition that provider
//!   notifications trigger. It is also responsible for expiring stale cache entries.
//! * [`LedgerManagement`] owns the confirmed queue, the sharded ledger, the aggregate counters and the archive. The
//!   reconciliation job and the ledger maintenance operations go through this trait.
//! * [`CampaignManagement`] provides read (and registration) access to per-campaign payment settings.
//!
//! ## Providers
//! * [`PaymentProviderGateway`] creates payments at, and verifies payments with, the external payment providers.
mod campaign_management;
mod data_objects;
mod ledger_management;
mod payment_cache;
mod payment_provider;

pub use campaign_management::{CampaignManagement, CampaignSettingsError};
pub use data_objects::{CacheExpiryResult, MergeFailure, MergeResult};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use payment_cache::{PaymentCacheError, PaymentCacheManagement};
pub use payment_provider::{CreatedPayment, PaymentProviderGateway, PaymentRequest, ProviderError};
