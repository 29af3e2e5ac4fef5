//! `SqliteDatabase` is a concrete implementation of a donation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use glow_common::Amount;
use log::*;
use sqlx::{migrate, Acquire, SqliteConnection, SqlitePool};

use super::db::{archive, cache, campaigns, confirmed, counters, db_url, new_pool, shards};
use crate::{
    db_types::{
        AggregateCounters,
        ArchivedPayment,
        CacheEntry,
        CampaignSettings,
        ConfirmedPayment,
        DonationRecord,
        DonationUpdate,
        NewCacheEntry,
        NewDonation,
        PaymentState,
        Provider,
        ProviderEvidence,
        Shard,
        SHARD_CAPACITY,
    },
    traits::{
        CacheExpiryResult,
        CampaignManagement,
        CampaignSettingsError,
        LedgerError,
        LedgerManagement,
        MergeFailure,
        MergeResult,
        PaymentCacheError,
        PaymentCacheManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

enum MergeOutcome {
    /// The new ledger record and the counters that include it
    Merged(DonationRecord, AggregateCounters),
    AlreadyArchived,
}

impl CampaignManagement for SqliteDatabase {
    async fn fetch_campaign_settings(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignSettings>, CampaignSettingsError> {
        let mut conn = self.pool.acquire().await?;
        let settings = campaigns::fetch_settings(campaign_id, &mut conn).await?;
        Ok(settings)
    }

    async fn upsert_campaign_settings(&self, settings: CampaignSettings) -> Result<(), CampaignSettingsError> {
        if settings.campaign_id.trim().is_empty() {
            return Err(CampaignSettingsError::InvalidSettings("The campaign id cannot be empty".into()));
        }
        let mut conn = self.pool.acquire().await?;
        let id = settings.campaign_id.clone();
        campaigns::upsert_settings(settings, &mut conn).await?;
        debug!("🗃️ Payment settings for campaign {id} saved");
        Ok(())
    }
}

impl PaymentCacheManagement for SqliteDatabase {
    async fn insert_cache_entry(&self, entry: NewCacheEntry) -> Result<CacheEntry, PaymentCacheError> {
        let mut tx = self.pool.begin().await?;
        let entry = cache::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ [{}] {} cached for campaign {}", entry.provider, entry.reference, entry.payload.campaign_id);
        Ok(entry)
    }

    async fn fetch_cache_entry(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<CacheEntry>, PaymentCacheError> {
        let mut conn = self.pool.acquire().await?;
        let entry = cache::fetch_entry(provider, reference, &mut conn).await?;
        Ok(entry)
    }

    /// Deletes the cache row and inserts the confirmed queue row in one transaction. The delete runs first and returns
    /// the row, so of several concurrent promotions of the same reference exactly one sees the row and the others get
    /// `None`.
    async fn promote_to_confirmed(
        &self,
        provider: Provider,
        reference: &str,
        evidence: ProviderEvidence,
    ) -> Result<Option<ConfirmedPayment>, PaymentCacheError> {
        let mut tx = self.pool.begin().await?;
        let entry = match cache::delete_entry(provider, reference, &mut tx).await? {
            Some(entry) => entry,
            None => {
                debug!("🗃️ [{provider}] {reference} is no longer in the cache. Nothing to promote");
                tx.rollback().await?;
                return Ok(None);
            },
        };
        let payment = confirmed::insert_confirmed(entry, evidence, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ [{provider}] {reference} moved from the cache to the confirmed queue");
        Ok(Some(payment))
    }

    async fn remove_cache_entry(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<CacheEntry>, PaymentCacheError> {
        let mut conn = self.pool.acquire().await?;
        let entry = cache::delete_entry(provider, reference, &mut conn).await?;
        if entry.is_some() {
            debug!("🗃️ [{provider}] {reference} removed from the cache");
        }
        Ok(entry)
    }

    async fn expire_cache_entries(
        &self,
        provider: Provider,
        cutoff: DateTime<Utc>,
    ) -> Result<CacheExpiryResult, PaymentCacheError> {
        let mut conn = self.pool.acquire().await?;
        let expired = cache::expire_entries(provider, cutoff, &mut conn).await?;
        trace!("🗃️ [{provider}] {} cache entries older than {cutoff} deleted", expired.len());
        Ok(CacheExpiryResult { provider, expired })
    }

    async fn fetch_payment_state(&self, provider: Provider, reference: &str) -> Result<PaymentState, PaymentCacheError> {
        let mut conn = self.pool.acquire().await?;
        if archive::fetch_archived(provider, reference, &mut conn).await?.is_some() {
            return Ok(PaymentState::Completed);
        }
        if confirmed::fetch_by_reference(provider, reference, &mut conn).await?.is_some() {
            return Ok(PaymentState::Confirmed);
        }
        if cache::fetch_entry(provider, reference, &mut conn).await?.is_some() {
            return Ok(PaymentState::Pending);
        }
        Ok(PaymentState::Unknown)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_confirmed_payments(&self, provider: Provider) -> Result<Vec<ConfirmedPayment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let payments = confirmed::fetch_queue(provider, &mut conn).await?;
        Ok(payments)
    }

    async fn merge_confirmed_payments(
        &self,
        campaign_id: &str,
        payments: &[ConfirmedPayment],
    ) -> Result<MergeResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        counters::ensure_counters(campaign_id, &mut tx).await?;
        let mut totals = counters::fetch_counters(campaign_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::CampaignNotFound(campaign_id.to_string()))?;
        trace!("🗃️ Merging {} payments into {campaign_id}. Current total: {}", payments.len(), totals.total);
        let mut merged = Vec::with_capacity(payments.len());
        let mut duplicates = Vec::new();
        let mut failed = Vec::new();
        for payment in payments {
            if payment.campaign_id() != campaign_id {
                warn!(
                    "🗃️ [{}] {} belongs to campaign {}, not {campaign_id}. Skipping it.",
                    payment.provider,
                    payment.reference,
                    payment.campaign_id()
                );
                failed.push(MergeFailure {
                    provider: payment.provider,
                    reference: payment.reference.clone(),
                    reason: format!("Payment belongs to campaign {}", payment.campaign_id()),
                });
                continue;
            }
            let mut savepoint = tx.begin().await?;
            match merge_one(campaign_id, payment, &totals, &mut savepoint).await {
                Ok(MergeOutcome::Merged(record, next_totals)) => {
                    savepoint.commit().await?;
                    totals = next_totals;
                    trace!("🗃️ [{}] {} is donation #{} in {campaign_id}", payment.provider, payment.reference, record.number);
                    merged.push(record);
                },
                Ok(MergeOutcome::AlreadyArchived) => {
                    savepoint.commit().await?;
                    info!(
                        "🗃️ [{}] {} was already archived. Removed it from the queue without a new donation.",
                        payment.provider, payment.reference
                    );
                    duplicates.push(payment.reference.clone());
                },
                Err(e) => {
                    savepoint.rollback().await?;
                    error!(
                        "🗃️ [{}] {} could not be merged into {campaign_id}. It stays queued for the next run. {e}",
                        payment.provider, payment.reference
                    );
                    failed.push(MergeFailure {
                        provider: payment.provider,
                        reference: payment.reference.clone(),
                        reason: e.to_string(),
                    });
                },
            }
        }
        totals.updated_at = Utc::now();
        counters::save_counters(&totals, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Campaign {campaign_id}: {} merged, {} duplicates, {} failed. Total is now {} ({})",
            merged.len(),
            duplicates.len(),
            failed.len(),
            totals.total,
            totals.total_amount
        );
        Ok(MergeResult { campaign_id: campaign_id.to_string(), merged, duplicates, failed, counters: totals })
    }

    async fn fetch_counters(&self, campaign_id: &str) -> Result<Option<AggregateCounters>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = counters::fetch_counters(campaign_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_shards(&self, campaign_id: &str) -> Result<Vec<Shard>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = shards::fetch_shards(campaign_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_archived_payment(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<Option<ArchivedPayment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = archive::fetch_archived(provider, reference, &mut conn).await?;
        Ok(result)
    }

    async fn add_donation(&self, campaign_id: &str, donation: NewDonation) -> Result<DonationRecord, LedgerError> {
        if donation.amount.cents() < 0 {
            return Err(LedgerError::InvalidUpdate("Donation amounts cannot be negative".into()));
        }
        let mut tx = self.pool.begin().await?;
        let totals = recompute_totals(campaign_id, &mut tx).await?;
        let record = donation.into_record(totals.total + 1);
        let shard_index = append_to_ledger(campaign_id, totals.next_shard_index(), &record, &mut tx).await?;
        let totals = recompute_totals(campaign_id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "🗃️ Donation #{} ({}) added by hand to shard {shard_index} of {campaign_id}. Total is now {}",
            record.number, record.amount, totals.total_amount
        );
        Ok(record)
    }

    async fn update_donation(
        &self,
        campaign_id: &str,
        number: i64,
        update: &DonationUpdate,
    ) -> Result<DonationRecord, LedgerError> {
        if update.is_empty() {
            return Err(LedgerError::InvalidUpdate("The update does not change anything".into()));
        }
        if matches!(update.amount, Some(a) if a.cents() < 0) {
            return Err(LedgerError::InvalidUpdate("Donation amounts cannot be negative".into()));
        }
        let mut tx = self.pool.begin().await?;
        counters::ensure_counters(campaign_id, &mut tx).await?;
        let all_shards = shards::fetch_shards(campaign_id, &mut tx).await?;
        let mut target = None;
        for shard in all_shards {
            if let Some(pos) = shard.candles.iter().position(|c| c.number == number) {
                target = Some((shard, pos));
                break;
            }
        }
        let (mut shard, pos) =
            target.ok_or_else(|| LedgerError::DonationNotFound { campaign_id: campaign_id.to_string(), number })?;
        shard.candles[pos].apply_update(update);
        let updated = shard.candles[pos].clone();
        shards::save_shard(campaign_id, shard.shard_index, &shard.candles, &mut tx).await?;
        recompute_totals(campaign_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Donation #{number} in {campaign_id} updated");
        Ok(updated)
    }

    async fn delete_donation(&self, campaign_id: &str, number: i64) -> Result<DonationRecord, LedgerError> {
        let mut tx = self.pool.begin().await?;
        counters::ensure_counters(campaign_id, &mut tx).await?;
        let all_shards = shards::fetch_shards(campaign_id, &mut tx).await?;
        let mut records = all_shards.into_iter().flat_map(|s| s.candles.0).collect::<Vec<DonationRecord>>();
        records.sort_by_key(|r| r.number);
        let pos = records
            .iter()
            .position(|r| r.number == number)
            .ok_or_else(|| LedgerError::DonationNotFound { campaign_id: campaign_id.to_string(), number })?;
        let removed = records.remove(pos);
        records.iter_mut().skip(pos).for_each(|r| r.number -= 1);
        let mut shard_count = 0i64;
        for (index, chunk) in records.chunks(SHARD_CAPACITY).enumerate() {
            shards::save_shard(campaign_id, index as i64, chunk, &mut tx).await?;
            shard_count += 1;
        }
        let dropped = shards::delete_shards_from(campaign_id, shard_count, &mut tx).await?;
        if dropped > 0 {
            trace!("🗃️ {dropped} empty shards removed from {campaign_id}");
        }
        recompute_totals(campaign_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Donation #{number} removed from {campaign_id}. {} later donations renumbered", records.len() - pos);
        Ok(removed)
    }

    async fn recompute_counters(&self, campaign_id: &str) -> Result<AggregateCounters, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = recompute_totals(campaign_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Counters for {campaign_id} recomputed. Total: {} ({})", result.total, result.total_amount);
        Ok(result)
    }
}

/// Places a single confirmed payment into the ledger, archives it and removes it from the queue. Run inside a
/// savepoint: on error nothing of this payment must survive.
async fn merge_one(
    campaign_id: &str,
    payment: &ConfirmedPayment,
    totals: &AggregateCounters,
    conn: &mut SqliteConnection,
) -> Result<MergeOutcome, LedgerError> {
    if archive::fetch_archived(payment.provider, &payment.reference, conn).await?.is_some() {
        confirmed::delete_confirmed(payment.id, conn).await?;
        return Ok(MergeOutcome::AlreadyArchived);
    }
    if payment.amount().cents() < 0 {
        return Err(LedgerError::InvalidUpdate(format!("Negative donation amount {}", payment.amount())));
    }
    let next_totals = totals.with_donation(payment.amount()).ok_or_else(|| {
        LedgerError::InvalidUpdate(format!("A donation of {} would overflow the campaign totals", payment.amount()))
    })?;
    let number = next_totals.total;
    let record = DonationRecord::from_confirmed(number, payment);
    append_to_ledger(campaign_id, totals.next_shard_index(), &record, conn).await?;
    archive::insert_archived(payment, number, conn).await?;
    if !confirmed::delete_confirmed(payment.id, conn).await? {
        return Err(LedgerError::CorruptLedger(format!(
            "Confirmed payment #{} disappeared from the queue during the merge",
            payment.id
        )));
    }
    Ok(MergeOutcome::Merged(record, next_totals))
}

/// Appends `record` to the first shard from `shard_index` on that still has room, and returns that shard's index.
async fn append_to_ledger(
    campaign_id: &str,
    mut shard_index: i64,
    record: &DonationRecord,
    conn: &mut SqliteConnection,
) -> Result<i64, LedgerError> {
    let mut candles = loop {
        match shards::fetch_shard(campaign_id, shard_index, conn).await? {
            Some(shard) if shard.is_full() => shard_index += 1,
            Some(shard) => break shard.candles.0,
            None => break Vec::with_capacity(1),
        }
    };
    candles.push(record.clone());
    shards::save_shard(campaign_id, shard_index, &candles, conn).await?;
    Ok(shard_index)
}

/// Sets `total` and `total_amount` from the ledger contents, leaving the current-period counters alone.
async fn recompute_totals(campaign_id: &str, conn: &mut SqliteConnection) -> Result<AggregateCounters, LedgerError> {
    counters::ensure_counters(campaign_id, conn).await?;
    let mut totals = counters::fetch_counters(campaign_id, conn)
        .await?
        .ok_or_else(|| LedgerError::CampaignNotFound(campaign_id.to_string()))?;
    let all_shards = shards::fetch_shards(campaign_id, conn).await?;
    totals.total = all_shards.iter().map(|s| s.len() as i64).sum();
    totals.total_amount = Amount::checked_sum(all_shards.iter().flat_map(|s| s.candles.iter().map(|c| c.amount)))
        .ok_or_else(|| LedgerError::InvalidUpdate(format!("The donations in {campaign_id} overflow the total")))?;
    totals.updated_at = Utc::now();
    counters::save_counters(&totals, conn).await?;
    Ok(totals)
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
