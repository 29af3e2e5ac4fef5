#![allow(dead_code)]
use chrono::{DateTime, Duration, Utc};
use glow_common::Amount;
use glow_engine::{
    db_types::{
        CampaignSettings,
        ConfirmedPayment,
        DonationPayload,
        DonationRecord,
        NewCacheEntry,
        Provider,
        ProviderEvidence,
    },
    CampaignManagement,
    PaymentCacheManagement,
    SqliteDatabase,
};
use sqlx::types::Json;

pub const PAYNL_CAMPAIGN: &str = "lichtjes-gent";
pub const PAYCONIQ_CAMPAIGN: &str = "kaarsjes-brugge";

pub async fn register_campaigns(db: &SqliteDatabase) {
    let paynl = CampaignSettings::new(PAYNL_CAMPAIGN, Provider::PayNl).with_paynl_service_id("SL-1234-5678");
    let payconiq = CampaignSettings::new(PAYCONIQ_CAMPAIGN, Provider::Payconiq)
        .with_payconiq_api_key("52989c01-9fc3-47b0-b1a0-dc1e5ef49fd6")
        .with_anonymous_donations(true);
    db.upsert_campaign_settings(paynl).await.expect("Error saving campaign settings");
    db.upsert_campaign_settings(payconiq).await.expect("Error saving campaign settings");
}

pub fn payload(campaign_id: &str, name: &str, euros: i64) -> DonationPayload {
    DonationPayload {
        campaign_id: campaign_id.to_string(),
        name: name.to_string(),
        description: format!("Een kaarsje van {name}"),
        lat: 51.05,
        lng: 3.72,
        amount: Amount::from_euros(euros),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        anonymous: false,
        language: Some("nl-BE".into()),
    }
}

pub fn succeeded(provider: Provider, payment_id: &str) -> ProviderEvidence {
    match provider {
        Provider::PayNl => ProviderEvidence::PayNl {
            transaction_id: payment_id.to_string(),
            state: "100".into(),
            state_name: "PAID".into(),
            amount_paid: None,
        },
        Provider::Payconiq => ProviderEvidence::Payconiq {
            payment_id: payment_id.to_string(),
            status: "SUCCEEDED".into(),
            amount: None,
        },
    }
}

/// Caches a donation and immediately promotes it, as a successful provider notification would.
pub async fn confirm_donation(
    db: &SqliteDatabase,
    provider: Provider,
    reference: &str,
    payload: DonationPayload,
) -> ConfirmedPayment {
    let entry = NewCacheEntry::new(provider, reference.to_string(), reference.to_string(), payload);
    db.insert_cache_entry(entry).await.expect("Error caching donation");
    db.promote_to_confirmed(provider, reference, succeeded(provider, reference))
        .await
        .expect("Error promoting donation")
        .expect("Donation was not in the cache")
}

pub async fn cache_donation_at(
    db: &SqliteDatabase,
    provider: Provider,
    reference: &str,
    payload: DonationPayload,
    created_at: DateTime<Utc>,
) {
    let entry =
        NewCacheEntry::new(provider, reference.to_string(), reference.to_string(), payload).with_created_at(created_at);
    db.insert_cache_entry(entry).await.expect("Error caching donation");
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

/// Writes `count` donations straight into the ledger of `campaign_id`, filling shards to capacity, and sets the
/// counters to match. Every donation is €10.
pub async fn seed_ledger(db: &SqliteDatabase, campaign_id: &str, count: i64) {
    let start = Utc::now() - Duration::days(30);
    let records = (1..=count)
        .map(|n| DonationRecord {
            number: n,
            name: format!("Seed {n}"),
            description: String::new(),
            lat: 50.0 + (n as f64) / 10_000.0,
            lng: 4.0,
            amount: Amount::from_euros(10),
            date: start + Duration::minutes(n),
            email: None,
            provider: Provider::PayNl,
            reference: format!("seed-{n}"),
            anonymous: false,
        })
        .collect::<Vec<_>>();
    for (index, chunk) in records.chunks(1000).enumerate() {
        sqlx::query("INSERT INTO ledger_shards (campaign_id, shard_index, candles) VALUES ($1, $2, $3)")
            .bind(campaign_id)
            .bind(index as i64)
            .bind(Json(chunk))
            .execute(db.pool())
            .await
            .expect("Error seeding shard");
    }
    sqlx::query(
        "INSERT INTO campaign_counters (campaign_id, total, total_amount, current_period_count, \
         current_period_amount) VALUES ($1, $2, $3, $2, $3)",
    )
    .bind(campaign_id)
    .bind(count)
    .bind(count * 1000)
    .execute(db.pool())
    .await
    .expect("Error seeding counters");
}
