use chrono::{DateTime, Utc};
use glow_common::Amount;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ConfirmedPayment, DonationRecord, PaymentStatus, Provider},
    helpers::format_donation_date,
    traits::MergeFailure,
};

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 140;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Donations below this many whole euros are raised to it.
pub const MINIMUM_DONATION_EUROS: i64 = 5;
/// Larger donations are refused, both from donors and from admin edits.
pub const MAXIMUM_DONATION_EUROS: i64 = 100_000;

/// A donation as submitted by the front end. Amounts are in euros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub campaign_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatedDonation {
    pub provider: Provider,
    pub reference: String,
    pub checkout_url: String,
}

/// What became of a provider notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// The provider confirmed the payment and it is now queued for reconciliation
    Confirmed(ConfirmedPayment),
    /// The reference is not (or no longer) in the cache: a duplicate delivery, an expired entry or an unknown reference
    AlreadyProcessed,
    /// The provider has not settled the payment yet
    Pending,
    /// The provider reports the payment as final without settlement. The cache entry was removed.
    Rejected(String),
}

impl NotificationOutcome {
    pub fn status(&self) -> Option<PaymentStatus> {
        match self {
            NotificationOutcome::Confirmed(_) => Some(PaymentStatus::Succeeded),
            NotificationOutcome::Pending => Some(PaymentStatus::Pending),
            NotificationOutcome::Rejected(_) => Some(PaymentStatus::Failed),
            NotificationOutcome::AlreadyProcessed => None,
        }
    }
}

/// The public view of a ledger record. Email addresses are never exposed, and names are blanked for anonymous
/// donations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationDto {
    pub number: i64,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub amount: Amount,
    pub formatted_date: String,
}

impl From<&DonationRecord> for DonationDto {
    fn from(record: &DonationRecord) -> Self {
        Self {
            number: record.number,
            name: if record.anonymous { String::new() } else { record.name.clone() },
            description: record.description.clone(),
            lat: record.lat,
            lng: record.lng,
            amount: record.amount,
            formatted_date: format_donation_date(&record.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationPage {
    pub data: Vec<DonationDto>,
    /// The coordinates of every donation in the campaign, not just this page
    pub locations: Vec<[f64; 2]>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReconciliation {
    pub provider: Option<Provider>,
    pub merged: usize,
    pub duplicates: usize,
    pub failures: Vec<MergeFailure>,
    pub campaigns: Vec<String>,
}

impl ProviderReconciliation {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub providers: Vec<ProviderReconciliation>,
}

impl ReconciliationReport {
    pub fn total_merged(&self) -> usize {
        self.providers.iter().map(|p| p.merged).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.providers.iter().map(|p| p.failed()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryReport {
    pub expired: Vec<(Provider, String)>,
}

impl ExpiryReport {
    pub fn count(&self) -> usize {
        self.expired.len()
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn anonymous_names_are_hidden() {
        let record = DonationRecord {
            number: 12,
            name: "Jef".into(),
            description: "Voor oma".into(),
            lat: 51.2,
            lng: 4.4,
            amount: Amount::from_euros(10),
            date: Utc.with_ymd_and_hms(2023, 12, 24, 18, 0, 0).unwrap(),
            email: Some("jef@example.com".into()),
            provider: Provider::Payconiq,
            reference: "abc".into(),
            anonymous: true,
        };
        let dto = DonationDto::from(&record);
        assert_eq!(dto.name, "");
        assert_eq!(dto.formatted_date, "24/12/2023");
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["amount"], 1000);
    }

    #[test]
    fn donation_request_defaults() {
        let req: DonationRequest =
            serde_json::from_str(r#"{"campaign_id":"kaarsjes","name":"An","lat":50.8,"lng":4.3,"amount":7.4}"#).unwrap();
        assert!(!req.anonymous);
        assert!(req.description.is_none());
        assert_eq!(req.amount, Some(7.4));
    }
}
