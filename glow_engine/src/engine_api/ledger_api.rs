use std::fmt::Debug;

use glow_common::Amount;
use log::*;

use crate::{
    db_types::{AggregateCounters, DonationRecord, DonationUpdate, NewDonation},
    engine_api::{
        donation_objects::{
            DonationDto,
            DonationPage,
            DEFAULT_PAGE_SIZE,
            MAXIMUM_DONATION_EUROS,
            MAX_DESCRIPTION_LENGTH,
            MAX_NAME_LENGTH,
        },
        errors::PaymentFlowError,
    },
    helpers::truncate_field,
    traits::LedgerManagement,
};

/// The read path of the campaign ledgers, and administrative maintenance of ledger records.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Every record in the campaign ledger, newest first.
    pub async fn all_donations(&self, campaign_id: &str) -> Result<Vec<DonationRecord>, PaymentFlowError> {
        let shards = self.db.fetch_shards(campaign_id).await?;
        let mut records = shards.into_iter().flat_map(|s| s.candles.0).collect::<Vec<_>>();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.number.cmp(&a.number)));
        Ok(records)
    }

    /// A page of public donation records, newest first.
    ///
    /// `page_size == -1` returns everything after `offset`. A negative offset is treated as 0, and any other
    /// non-positive page size falls back to the default of 20.
    pub async fn list_donations(
        &self,
        campaign_id: &str,
        offset: i64,
        page_size: i64,
    ) -> Result<DonationPage, PaymentFlowError> {
        let records = self.all_donations(campaign_id).await?;
        let total_count = records.len();
        let locations = records.iter().map(|r| [r.lat, r.lng]).collect();
        let offset = usize::try_from(offset.max(0)).unwrap_or_default();
        let take = match page_size {
            -1 => usize::MAX,
            n if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => DEFAULT_PAGE_SIZE as usize,
        };
        let data = records.iter().skip(offset).take(take).map(DonationDto::from).collect();
        trace!("📒️ {campaign_id}: page at {offset} of {total_count} donations served");
        Ok(DonationPage { data, locations, total_count })
    }

    /// The most recent donation in the campaign, if there is one.
    pub async fn latest_donation(&self, campaign_id: &str) -> Result<Option<DonationDto>, PaymentFlowError> {
        let records = self.all_donations(campaign_id).await?;
        Ok(records.first().map(DonationDto::from))
    }

    pub async fn counters(&self, campaign_id: &str) -> Result<AggregateCounters, PaymentFlowError> {
        let counters = self
            .db
            .fetch_counters(campaign_id)
            .await?
            .unwrap_or_else(|| AggregateCounters::empty(campaign_id));
        Ok(counters)
    }

    /// Edits a ledger record. Text fields follow the same length rules as new donations. The counters are recomputed
    /// in the same transaction.
    pub async fn edit_donation(
        &self,
        campaign_id: &str,
        number: i64,
        mut update: DonationUpdate,
    ) -> Result<DonationRecord, PaymentFlowError> {
        if let Some(name) = update.name.take() {
            let name = truncate_field(&name, MAX_NAME_LENGTH);
            if name.is_empty() {
                return Err(PaymentFlowError::InvalidArgument("A donation needs a name".into()));
            }
            update.name = Some(name);
        }
        update.description = update.description.map(|d| truncate_field(&d, MAX_DESCRIPTION_LENGTH));
        if let Some(amount) = update.amount {
            check_amount(amount)?;
        }
        if update.lat.is_some() || update.lng.is_some() {
            check_location(update.lat.unwrap_or_default(), update.lng.unwrap_or_default())?;
        }
        let record = self.db.update_donation(campaign_id, number, &update).await?;
        info!("📒️ Donation #{number} in {campaign_id} edited");
        Ok(record)
    }

    /// Adds a donation by hand, e.g. one that was paid in cash. It gets the next sequence number in the ledger, and
    /// the counters are recomputed in the same transaction.
    pub async fn add_donation(
        &self,
        campaign_id: &str,
        mut donation: NewDonation,
    ) -> Result<DonationRecord, PaymentFlowError> {
        donation.name = truncate_field(&donation.name, MAX_NAME_LENGTH);
        if donation.name.is_empty() {
            return Err(PaymentFlowError::InvalidArgument("A donation needs a name".into()));
        }
        donation.description = truncate_field(&donation.description, MAX_DESCRIPTION_LENGTH);
        donation.reference = donation.reference.trim().to_string();
        if donation.reference.is_empty() {
            return Err(PaymentFlowError::InvalidArgument("A donation needs a reference".into()));
        }
        check_amount(donation.amount)?;
        check_location(donation.lat, donation.lng)?;
        let record = self.db.add_donation(campaign_id, donation).await?;
        info!("📒️ Donation #{} ({}) added to {campaign_id}", record.number, record.amount);
        Ok(record)
    }

    /// Deletes a ledger record. Later records are renumbered so that sequence numbers stay contiguous, and the
    /// counters are recomputed in the same transaction.
    pub async fn delete_donation(&self, campaign_id: &str, number: i64) -> Result<DonationRecord, PaymentFlowError> {
        let record = self.db.delete_donation(campaign_id, number).await?;
        info!("📒️ Donation #{number} ({}) deleted from {campaign_id}", record.amount);
        Ok(record)
    }

    pub async fn recompute_counters(&self, campaign_id: &str) -> Result<AggregateCounters, PaymentFlowError> {
        let counters = self.db.recompute_counters(campaign_id).await?;
        Ok(counters)
    }
}

fn check_amount(amount: Amount) -> Result<(), PaymentFlowError> {
    if amount.cents() < 0 || amount > Amount::from_euros(MAXIMUM_DONATION_EUROS) {
        return Err(PaymentFlowError::InvalidArgument(format!(
            "{amount} is not a valid donation amount. Donations are limited to €{MAXIMUM_DONATION_EUROS}"
        )));
    }
    Ok(())
}

fn check_location(lat: f64, lng: f64) -> Result<(), PaymentFlowError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(PaymentFlowError::InvalidArgument(format!("({lat}, {lng}) is not a valid location")));
    }
    Ok(())
}
