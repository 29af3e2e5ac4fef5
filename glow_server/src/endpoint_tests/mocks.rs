use chrono::{DateTime, Utc};
use glow_engine::{
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
    },
    traits::{
        CacheExpiryResult,
        CampaignManagement,
        CampaignSettingsError,
        LedgerError,
        LedgerManagement,
        MergeResult,
        PaymentCacheError,
        PaymentCacheManagement,
    },
};
use mockall::mock;

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl CampaignManagement for Store {
        async fn fetch_campaign_settings(&self, campaign_id: &str) -> Result<Option<CampaignSettings>, CampaignSettingsError>;
        async fn upsert_campaign_settings(&self, settings: CampaignSettings) -> Result<(), CampaignSettingsError>;
    }
    impl PaymentCacheManagement for Store {
        async fn insert_cache_entry(&self, entry: NewCacheEntry) -> Result<CacheEntry, PaymentCacheError>;
        async fn fetch_cache_entry(&self, provider: Provider, reference: &str) -> Result<Option<CacheEntry>, PaymentCacheError>;
        async fn promote_to_confirmed(&self, provider: Provider, reference: &str, evidence: ProviderEvidence) -> Result<Option<ConfirmedPayment>, PaymentCacheError>;
        async fn remove_cache_entry(&self, provider: Provider, reference: &str) -> Result<Option<CacheEntry>, PaymentCacheError>;
        async fn expire_cache_entries(&self, provider: Provider, cutoff: DateTime<Utc>) -> Result<CacheExpiryResult, PaymentCacheError>;
        async fn fetch_payment_state(&self, provider: Provider, reference: &str) -> Result<PaymentState, PaymentCacheError>;
    }
    impl LedgerManagement for Store {
        async fn fetch_confirmed_payments(&self, provider: Provider) -> Result<Vec<ConfirmedPayment>, LedgerError>;
        async fn merge_confirmed_payments(&self, campaign_id: &str, payments: &[ConfirmedPayment]) -> Result<MergeResult, LedgerError>;
        async fn fetch_counters(&self, campaign_id: &str) -> Result<Option<AggregateCounters>, LedgerError>;
        async fn fetch_shards(&self, campaign_id: &str) -> Result<Vec<Shard>, LedgerError>;
        async fn fetch_archived_payment(&self, provider: Provider, reference: &str) -> Result<Option<ArchivedPayment>, LedgerError>;
        async fn add_donation(&self, campaign_id: &str, donation: NewDonation) -> Result<DonationRecord, LedgerError>;
        async fn update_donation(&self, campaign_id: &str, number: i64, update: &DonationUpdate) -> Result<DonationRecord, LedgerError>;
        async fn delete_donation(&self, campaign_id: &str, number: i64) -> Result<DonationRecord, LedgerError>;
        async fn recompute_counters(&self, campaign_id: &str) -> Result<AggregateCounters, LedgerError>;
    }
}
