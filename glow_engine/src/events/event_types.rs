use serde::{Deserialize, Serialize};

use crate::db_types::{AggregateCounters, ConfirmedPayment, DonationRecord, Provider};

/// A provider confirmed a payment and it was moved into the confirmed queue. This is the hook for sending the donor a
/// receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmedEvent {
    pub payment: ConfirmedPayment,
}

impl PaymentConfirmedEvent {
    pub fn new(payment: ConfirmedPayment) -> Self {
        Self { payment }
    }
}

/// A reconciliation batch was committed to a campaign ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationsMergedEvent {
    pub provider: Provider,
    pub campaign_id: String,
    pub donations: Vec<DonationRecord>,
    pub counters: AggregateCounters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    PaymentConfirmed(PaymentConfirmedEvent),
    DonationsMerged(DonationsMergedEvent),
}
