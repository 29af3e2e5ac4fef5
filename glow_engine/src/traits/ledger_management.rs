use thiserror::Error;

use crate::{
    db_types::{
        AggregateCounters,
        ArchivedPayment,
        ConfirmedPayment,
        DonationRecord,
        DonationUpdate,
        NewDonation,
        Provider,
        Shard,
    },
    traits::data_objects::MergeResult,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Campaign {0} has no ledger")]
    CampaignNotFound(String),
    #[error("Donation #{number} does not exist in campaign {campaign_id}")]
    DonationNotFound { campaign_id: String, number: i64 },
    #[error("Ledger data is corrupt. {0}")]
    CorruptLedger(String),
    #[error("Invalid ledger update. {0}")]
    InvalidUpdate(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The confirmed queue, the sharded ledger, the aggregate counters and the archive.
///
/// The reconciliation job is the only incremental writer of ledger shards and counters. The maintenance methods
/// ([`Self::add_donation`], [`Self::update_donation`], [`Self::delete_donation`], [`Self::recompute_counters`]) are for
/// administrative use, and recompute the counters from the ledger in the same transaction as their edit.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: Clone {
    /// All confirmed payments for the provider that are waiting to be merged, oldest first.
    async fn fetch_confirmed_payments(&self, provider: Provider) -> Result<Vec<ConfirmedPayment>, LedgerError>;

    /// Merges the confirmed payments, which must all belong to `campaign_id`, into the campaign ledger in a single
    /// store transaction.
    ///
    /// Each payment is applied inside its own savepoint. A payment that fails to merge is rolled back, reported in
    /// [`MergeResult::failed`] and left in the confirmed queue; it does not abort the batch. A payment whose reference
    /// is already archived is removed from the queue without touching the ledger.
    ///
    /// The counters are read once at the start and written once at the end of the batch.
    async fn merge_confirmed_payments(
        &self,
        campaign_id: &str,
        payments: &[ConfirmedPayment],
    ) -> Result<MergeResult, LedgerError>;

    async fn fetch_counters(&self, campaign_id: &str) -> Result<Option<AggregateCounters>, LedgerError>;

    /// All shards of the campaign ledger, ordered by shard index.
    async fn fetch_shards(&self, campaign_id: &str) -> Result<Vec<Shard>, LedgerError>;

    async fn fetch_archived_payment(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<ArchivedPayment>, LedgerError>;

    /// Appends a hand-entered donation with the next sequence number, opening a new shard when the last one is full.
    /// Returns the new record.
    async fn add_donation(&self, campaign_id: &str, donation: NewDonation) -> Result<DonationRecord, LedgerError>;

    /// Rewrites the donation with sequence number `number` in place. Returns the updated record.
    async fn update_donation(
        &self,
        campaign_id: &str,
        number: i64,
        update: &DonationUpdate,
    ) -> Result<DonationRecord, LedgerError>;

    /// Removes the donation with sequence number `number` and renumbers every later donation down by one, so that
    /// sequence numbers stay contiguous. Returns the removed record. Archived payments keep the number they were
    /// merged with.
    async fn delete_donation(&self, campaign_id: &str, number: i64) -> Result<DonationRecord, LedgerError>;

    /// Sets `total` and `total_amount` from a full scan of the ledger. The current-period counters are left as they
    /// are.
    async fn recompute_counters(&self, campaign_id: &str) -> Result<AggregateCounters, LedgerError>;
}
