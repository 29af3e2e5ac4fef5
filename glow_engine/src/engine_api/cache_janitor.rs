use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::Provider,
    engine_api::{donation_objects::ExpiryReport, errors::PaymentFlowError},
    traits::PaymentCacheManagement,
};

pub const DEFAULT_CACHE_RETENTION_HOURS: i64 = 24;

/// Removes cache entries that never received a confirmation within the retention window.
///
/// Only the cache is touched. Payments in the confirmed queue or the archive are never expired.
pub struct CacheJanitor<B> {
    db: B,
    retention: Duration,
}

impl<B> Debug for CacheJanitor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CacheJanitor (retention: {}h)", self.retention.num_hours())
    }
}

impl<B> CacheJanitor<B>
where B: PaymentCacheManagement
{
    pub fn new(db: B, retention: Duration) -> Self {
        Self { db, retention }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Expires every cache entry created before `now - retention`.
    pub async fn expire_stale_entries(&self) -> Result<ExpiryReport, PaymentFlowError> {
        self.expire_entries_before(Utc::now() - self.retention).await
    }

    /// Expires every cache entry created before `cutoff`, for all providers.
    pub async fn expire_entries_before(&self, cutoff: DateTime<Utc>) -> Result<ExpiryReport, PaymentFlowError> {
        let mut report = ExpiryReport::default();
        for provider in Provider::all() {
            let result = self.db.expire_cache_entries(provider, cutoff).await?;
            for entry in &result.expired {
                debug!(
                    "🧹️ [{provider}] {} for campaign {} expired unconfirmed (created {})",
                    entry.reference, entry.payload.campaign_id, entry.created_at
                );
            }
            report.expired.extend(result.expired.into_iter().map(|e| (provider, e.reference)));
        }
        if report.count() > 0 {
            info!("🧹️ {} unconfirmed cache entries older than {cutoff} removed", report.count());
        }
        Ok(report)
    }
}
