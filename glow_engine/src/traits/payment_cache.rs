use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{CacheEntry, ConfirmedPayment, NewCacheEntry, PaymentState, Provider, ProviderEvidence},
    traits::{data_objects::CacheExpiryResult, CampaignManagement, CampaignSettingsError},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentCacheError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Payment reference {1} already exists for {0}")]
    AlreadyExists(Provider, String),
    #[error("{0}")]
    CampaignSettings(#[from] CampaignSettingsError),
}

impl From<sqlx::Error> for PaymentCacheError {
    fn from(e: sqlx::Error) -> Self {
        PaymentCacheError::DatabaseError(e.to_string())
    }
}

/// The payment cache holds donations between "payment initiated" and "payment confirmed".
///
/// Every reference lives in at most one of the cache, the confirmed queue or the archive, and a reference can be
/// promoted out of the cache at most once. Backends must guarantee both under concurrent access.
#[allow(async_fn_in_trait)]
pub trait PaymentCacheManagement: Clone + CampaignManagement {
    /// Stores a new cache entry.
    ///
    /// Fails with [`PaymentCacheError::AlreadyExists`] if the reference is already known to the cache, the confirmed
    /// queue, or the archive for this provider.
    async fn insert_cache_entry(&self, entry: NewCacheEntry) -> Result<CacheEntry, PaymentCacheError>;

    async fn fetch_cache_entry(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<CacheEntry>, PaymentCacheError>;

    /// Atomically moves the cache entry into the confirmed queue, attaching the provider's evidence.
    ///
    /// Returns `None` if the entry is no longer in the cache, i.e. another delivery of the same notification got there
    /// first, or the janitor expired it. In that case nothing is written.
    async fn promote_to_confirmed(
        &self,
        provider: Provider,
        reference: &str,
        evidence: ProviderEvidence,
    ) -> Result<Option<ConfirmedPayment>, PaymentCacheError>;

    /// Deletes the cache entry, returning it if it existed.
    async fn remove_cache_entry(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<CacheEntry>, PaymentCacheError>;

    /// Deletes every cache entry for the provider created before `cutoff`. Confirmed and archived payments are never
    /// touched.
    async fn expire_cache_entries(
        &self,
        provider: Provider,
        cutoff: DateTime<Utc>,
    ) -> Result<CacheExpiryResult, PaymentCacheError>;

    /// Reports where in the pipeline the reference currently is.
    async fn fetch_payment_state(&self, provider: Provider, reference: &str) -> Result<PaymentState, PaymentCacheError>;
}
