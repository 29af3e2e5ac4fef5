//! Data types shared by the storage backends and the public engine API.
//!
//! The lifecycle of a donation maps onto these types as follows:
//! 1. [`NewCacheEntry`] / [`CacheEntry`]: payment initiated at a provider, waiting for confirmation.
//! 2. [`ConfirmedPayment`]: the provider confirmed the payment; queued for reconciliation.
//! 3. [`DonationRecord`] (inside a [`Shard`]) + [`ArchivedPayment`]: merged into the campaign ledger.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use glow_common::{Amount, Secret};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, Row, Type};
use thiserror::Error;

/// Maximum number of donation records held by a single ledger shard.
pub const SHARD_CAPACITY: usize = 1000;

//--------------------------------------       Provider        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Pay.nl (card, iDEAL, Bancontact via the Pay.nl REST API)
    PayNl,
    /// Payconiq by Bancontact (QR/app payments)
    Payconiq,
}

impl Provider {
    pub fn all() -> [Provider; 2] {
        [Provider::PayNl, Provider::Payconiq]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::PayNl => "paynl",
            Provider::Payconiq => "payconiq",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown payment provider: {0}")]
pub struct ProviderParseError(pub String);

impl FromStr for Provider {
    type Err = ProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paynl" => Ok(Provider::PayNl),
            "payconiq" => Ok(Provider::Payconiq),
            _ => Err(ProviderParseError(s.to_string())),
        }
    }
}

//--------------------------------------     PaymentStatus     -------------------------------------------------------
/// The single internal view of a provider's payment status. Every provider-specific status code is mapped into one of
/// these before it reaches shared logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    /// Failed, cancelled, expired or otherwise final without settlement.
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Succeeded => write!(f, "Succeeded"),
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------    ProviderEvidence   -------------------------------------------------------
/// The provider's authoritative answer to a status query, kept alongside the confirmed and archived payment records
/// for audit purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderEvidence {
    PayNl {
        transaction_id: String,
        /// The Pay.nl state code, e.g. "100" (paid), "20" (pending), "-90" (cancelled)
        state: String,
        state_name: String,
        amount_paid: Option<Amount>,
    },
    Payconiq {
        payment_id: String,
        /// The Payconiq status string, e.g. "SUCCEEDED", "PENDING", "EXPIRED"
        status: String,
        amount: Option<Amount>,
    },
}

impl ProviderEvidence {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderEvidence::PayNl { .. } => Provider::PayNl,
            ProviderEvidence::Payconiq { .. } => Provider::Payconiq,
        }
    }

    /// Maps the provider-specific status into the internal [`PaymentStatus`].
    ///
    /// Pay.nl: `100` is paid; any negative state is final without payment; everything else (20, 50, 90, 95, ...) is
    /// still in progress. Payconiq: `SUCCEEDED` is paid; `CANCELLED`, `EXPIRED`, `FAILED` and `AUTHORIZATION_FAILED`
    /// are final; everything else is in progress.
    pub fn status(&self) -> PaymentStatus {
        match self {
            ProviderEvidence::PayNl { state, .. } => match state.trim().parse::<i64>() {
                Ok(100) => PaymentStatus::Succeeded,
                Ok(code) if code < 0 => PaymentStatus::Failed,
                _ => PaymentStatus::Pending,
            },
            ProviderEvidence::Payconiq { status, .. } => match status.to_uppercase().as_str() {
                "SUCCEEDED" => PaymentStatus::Succeeded,
                "CANCELLED" | "EXPIRED" | "FAILED" | "AUTHORIZATION_FAILED" => PaymentStatus::Failed,
                _ => PaymentStatus::Pending,
            },
        }
    }

    /// A short human-readable description of the provider status, for logs.
    pub fn status_name(&self) -> String {
        match self {
            ProviderEvidence::PayNl { state, state_name, .. } => format!("{state} ({state_name})"),
            ProviderEvidence::Payconiq { status, .. } => status.clone(),
        }
    }
}

//--------------------------------------    DonationPayload    -------------------------------------------------------
/// What the donor submitted. This travels unchanged from the cache, through the confirmed queue, into the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DonationPayload {
    pub campaign_id: String,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub amount: Amount,
    pub email: Option<String>,
    pub anonymous: bool,
    pub language: Option<String>,
}

//--------------------------------------      CacheEntry       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct NewCacheEntry {
    pub provider: Provider,
    /// The reference the provider will quote in its notifications
    pub reference: String,
    /// The id used to query the provider's status endpoint. For Pay.nl this equals `reference`.
    pub provider_payment_id: String,
    pub payload: DonationPayload,
    pub created_at: DateTime<Utc>,
}

impl NewCacheEntry {
    pub fn new(provider: Provider, reference: String, provider_payment_id: String, payload: DonationPayload) -> Self {
        Self { provider, reference, provider_payment_id, payload, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CacheEntry {
    pub provider: Provider,
    pub reference: String,
    pub provider_payment_id: String,
    #[sqlx(flatten)]
    pub payload: DonationPayload,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   ConfirmedPayment    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ConfirmedPayment {
    pub id: i64,
    pub provider: Provider,
    pub reference: String,
    pub provider_payment_id: String,
    #[sqlx(flatten)]
    pub payload: DonationPayload,
    pub evidence: Json<ProviderEvidence>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmedPayment {
    pub fn campaign_id(&self) -> &str {
        self.payload.campaign_id.as_str()
    }

    pub fn amount(&self) -> Amount {
        self.payload.amount
    }
}

//--------------------------------------    ArchivedPayment    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ArchivedPayment {
    pub id: i64,
    pub provider: Provider,
    pub reference: String,
    pub provider_payment_id: String,
    #[sqlx(flatten)]
    pub payload: DonationPayload,
    pub evidence: Json<ProviderEvidence>,
    /// The ledger sequence number the donation received when it was merged. Deleting an earlier donation renumbers
    /// the ledger but not the archive, so look the ledger record up by `reference` rather than by this number.
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}

//--------------------------------------     PaymentState      -------------------------------------------------------
/// Where a payment reference currently lives in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    /// Initiated, awaiting provider confirmation
    Pending,
    /// Confirmed by the provider, awaiting reconciliation into the ledger
    Confirmed,
    /// Merged into the ledger and archived
    Completed,
    /// Never seen, or expired before confirmation
    Unknown,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Pending => write!(f, "Pending"),
            PaymentState::Confirmed => write!(f, "Confirmed"),
            PaymentState::Completed => write!(f, "Completed"),
            PaymentState::Unknown => write!(f, "Unknown"),
        }
    }
}

//--------------------------------------    DonationRecord     -------------------------------------------------------
/// A single candle in the campaign ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    /// The campaign-wide sequence number. Unique, contiguous, starting at 1.
    pub number: i64,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub amount: Amount,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub provider: Provider,
    /// The provider reference of the payment this donation came from
    pub reference: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl DonationRecord {
    pub fn from_confirmed(number: i64, payment: &ConfirmedPayment) -> Self {
        let p = &payment.payload;
        Self {
            number,
            name: p.name.clone(),
            description: p.description.clone(),
            lat: p.lat,
            lng: p.lng,
            amount: p.amount,
            date: payment.confirmed_at,
            email: p.email.clone(),
            provider: payment.provider,
            reference: payment.reference.clone(),
            anonymous: p.anonymous,
        }
    }

    pub fn apply_update(&mut self, update: &DonationUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(lat) = update.lat {
            self.lat = lat;
        }
        if let Some(lng) = update.lng {
            self.lng = lng;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(email) = &update.email {
            self.email = if email.is_empty() { None } else { Some(email.clone()) };
        }
        if let Some(anonymous) = update.anonymous {
            self.anonymous = anonymous;
        }
    }
}

/// A donation entered by hand, e.g. one that was paid outside the checkout. The ledger assigns its number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonation {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub amount: Amount,
    /// Defaults to the time the donation is added
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email: Option<String>,
    pub provider: Provider,
    pub reference: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl NewDonation {
    pub fn into_record(self, number: i64) -> DonationRecord {
        DonationRecord {
            number,
            name: self.name,
            description: self.description,
            lat: self.lat,
            lng: self.lng,
            amount: self.amount,
            date: self.date.unwrap_or_else(Utc::now),
            email: self.email.filter(|e| !e.is_empty()),
            provider: self.provider,
            reference: self.reference,
            anonymous: self.anonymous,
        }
    }
}

/// A partial edit of a ledger record. `None` fields are left unchanged. An empty `email` clears the address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub amount: Option<Amount>,
    pub date: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub anonymous: Option<bool>,
}

impl DonationUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

//--------------------------------------         Shard         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Shard {
    pub campaign_id: String,
    pub shard_index: i64,
    pub candles: Json<Vec<DonationRecord>>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.candles.len() >= SHARD_CAPACITY
    }

    pub fn total_amount(&self) -> Amount {
        self.candles.iter().map(|c| c.amount).sum()
    }
}

//--------------------------------------   AggregateCounters   -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AggregateCounters {
    pub campaign_id: String,
    /// Number of donations in the ledger
    pub total: i64,
    /// Sum of all donation amounts in the ledger
    pub total_amount: Amount,
    pub current_period_count: i64,
    pub current_period_amount: Amount,
    pub updated_at: DateTime<Utc>,
}

impl AggregateCounters {
    pub fn empty(campaign_id: &str) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            total: 0,
            total_amount: Amount::default(),
            current_period_count: 0,
            current_period_amount: Amount::default(),
            updated_at: Utc::now(),
        }
    }

    /// The counters after one more donation of `amount`, or `None` if a total would overflow.
    pub fn with_donation(&self, amount: Amount) -> Option<Self> {
        Some(Self {
            campaign_id: self.campaign_id.clone(),
            total: self.total.checked_add(1)?,
            total_amount: self.total_amount.checked_add(amount)?,
            current_period_count: self.current_period_count.checked_add(1)?,
            current_period_amount: self.current_period_amount.checked_add(amount)?,
            updated_at: self.updated_at,
        })
    }

    /// The shard the next donation belongs in, assuming the ledger and counters agree.
    pub fn next_shard_index(&self) -> i64 {
        self.total / SHARD_CAPACITY as i64
    }
}

//--------------------------------------   CampaignSettings    -------------------------------------------------------
/// Per-campaign payment integration settings. Campaigns themselves are managed elsewhere; the engine only reads these.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSettings {
    pub campaign_id: String,
    pub payment_method: Provider,
    pub paynl_service_id: Option<String>,
    pub payconiq_api_key: Option<Secret<String>>,
    pub allow_anonymous: bool,
    /// Overrides the default `https://{campaign}.{site_domain}` front-end URL
    pub custom_url: Option<String>,
}

impl CampaignSettings {
    pub fn new(campaign_id: &str, payment_method: Provider) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            payment_method,
            paynl_service_id: None,
            payconiq_api_key: None,
            allow_anonymous: false,
            custom_url: None,
        }
    }

    pub fn with_paynl_service_id<S: Into<String>>(mut self, service_id: S) -> Self {
        self.paynl_service_id = Some(service_id.into());
        self
    }

    pub fn with_payconiq_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.payconiq_api_key = Some(Secret::new(api_key.into()));
        self
    }

    pub fn with_anonymous_donations(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub fn with_custom_url<S: Into<String>>(mut self, url: S) -> Self {
        self.custom_url = Some(url.into());
        self
    }
}

impl<'r> FromRow<'r, SqliteRow> for CampaignSettings {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let api_key: Option<String> = row.try_get("payconiq_api_key")?;
        Ok(Self {
            campaign_id: row.try_get("campaign_id")?,
            payment_method: row.try_get("payment_method")?,
            paynl_service_id: row.try_get("paynl_service_id")?,
            payconiq_api_key: api_key.map(Secret::new),
            allow_anonymous: row.try_get("allow_anonymous")?,
            custom_url: row.try_get("custom_url")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn paynl(state: &str) -> ProviderEvidence {
        ProviderEvidence::PayNl {
            transaction_id: "EX-1234".into(),
            state: state.into(),
            state_name: "x".into(),
            amount_paid: None,
        }
    }

    fn payconiq(status: &str) -> ProviderEvidence {
        ProviderEvidence::Payconiq { payment_id: "p1".into(), status: status.into(), amount: None }
    }

    #[test]
    fn paynl_status_mapping() {
        assert_eq!(paynl("100").status(), PaymentStatus::Succeeded);
        assert_eq!(paynl("20").status(), PaymentStatus::Pending);
        assert_eq!(paynl("50").status(), PaymentStatus::Pending);
        assert_eq!(paynl("90").status(), PaymentStatus::Pending);
        assert_eq!(paynl("-90").status(), PaymentStatus::Failed);
        assert_eq!(paynl("-80").status(), PaymentStatus::Failed);
        assert_eq!(paynl("garbage").status(), PaymentStatus::Pending);
    }

    #[test]
    fn payconiq_status_mapping() {
        assert_eq!(payconiq("SUCCEEDED").status(), PaymentStatus::Succeeded);
        assert_eq!(payconiq("PENDING").status(), PaymentStatus::Pending);
        assert_eq!(payconiq("IDENTIFIED").status(), PaymentStatus::Pending);
        assert_eq!(payconiq("EXPIRED").status(), PaymentStatus::Failed);
        assert_eq!(payconiq("cancelled").status(), PaymentStatus::Failed);
    }

    #[test]
    fn evidence_is_tagged_by_provider() {
        let json = serde_json::to_value(paynl("100")).unwrap();
        assert_eq!(json["provider"], "paynl");
        assert_eq!(json["state"], "100");
        let back: ProviderEvidence = serde_json::from_value(json).unwrap();
        assert_eq!(back.provider(), Provider::PayNl);
    }

    #[test]
    fn provider_parsing() {
        assert_eq!("PayNL".parse::<Provider>().unwrap(), Provider::PayNl);
        assert_eq!("payconiq".parse::<Provider>().unwrap(), Provider::Payconiq);
        assert!("stripe".parse::<Provider>().is_err());
        assert_eq!(Provider::PayNl.to_string(), "paynl");
    }

    #[test]
    fn counters_pick_the_next_shard() {
        let mut c = AggregateCounters::empty("x");
        assert_eq!(c.next_shard_index(), 0);
        c.total = 999;
        assert_eq!(c.next_shard_index(), 0);
        c = c.with_donation(Amount::from_euros(20)).unwrap();
        assert_eq!(c.total, 1000);
        assert_eq!(c.total_amount, Amount::from_euros(20));
        assert_eq!(c.next_shard_index(), 1);
        c.total_amount = Amount::from_cents(i64::MAX - 100);
        assert!(c.with_donation(Amount::from_euros(1)).is_none());
        assert!(c.with_donation(Amount::from_cents(100)).is_some());
    }

    #[test]
    fn donation_update() {
        let mut rec = DonationRecord {
            number: 1,
            name: "Ann".into(),
            description: "".into(),
            lat: 1.0,
            lng: 2.0,
            amount: Amount::from_euros(5),
            date: Utc::now(),
            email: Some("ann@example.com".into()),
            provider: Provider::PayNl,
            reference: "r".into(),
            anonymous: false,
        };
        let update = DonationUpdate {
            name: Some("Anne".into()),
            email: Some(String::new()),
            amount: Some(Amount::from_euros(10)),
            ..Default::default()
        };
        assert!(!update.is_empty());
        rec.apply_update(&update);
        assert_eq!(rec.name, "Anne");
        assert_eq!(rec.email, None);
        assert_eq!(rec.amount, Amount::from_euros(10));
        assert_eq!(rec.lat, 1.0);
    }
}
