use serde::{Deserialize, Serialize};

use crate::db_types::{AggregateCounters, CacheEntry, DonationRecord, Provider};

/// The outcome of merging one campaign's batch of confirmed payments.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub campaign_id: String,
    /// Ledger records written in this batch, in sequence order
    pub merged: Vec<DonationRecord>,
    /// References that were already archived. They were dropped from the queue without a new ledger record.
    pub duplicates: Vec<String>,
    /// Payments that could not be merged. They remain in the confirmed queue for the next run.
    pub failed: Vec<MergeFailure>,
    /// The counters as committed at the end of the batch
    pub counters: AggregateCounters,
}

impl MergeResult {
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFailure {
    pub provider: Provider,
    pub reference: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct CacheExpiryResult {
    pub provider: Provider,
    pub expired: Vec<CacheEntry>,
}

impl CacheExpiryResult {
    pub fn count(&self) -> usize {
        self.expired.len()
    }
}
