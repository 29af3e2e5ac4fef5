use std::{collections::BTreeMap, fmt::Debug};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{ConfirmedPayment, Provider},
    engine_api::donation_objects::{ProviderReconciliation, ReconciliationReport},
    events::{DonationsMergedEvent, EventProducers},
    traits::{LedgerError, LedgerManagement, MergeFailure, MergeResult},
};

/// Drains the confirmed queues into the campaign ledgers.
///
/// Each campaign's batch is merged in its own store transaction. A failure in one campaign does not stop the others,
/// and a payment that fails to merge stays in its queue for the next run.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Runs one reconciliation pass over every provider.
    pub async fn run_reconciliation(&self) -> Result<ReconciliationReport, LedgerError> {
        let started_at = Utc::now();
        let mut providers = Vec::with_capacity(Provider::all().len());
        for provider in Provider::all() {
            providers.push(self.reconcile_provider(provider).await?);
        }
        Ok(ReconciliationReport { started_at, providers })
    }

    /// Merges the provider's confirmed queue into the ledger, one campaign at a time.
    ///
    /// Only a failure to read the queue is returned as an error. Campaign batches that fail are logged and their
    /// payments reported as failures.
    pub async fn reconcile_provider(&self, provider: Provider) -> Result<ProviderReconciliation, LedgerError> {
        let queue = self.db.fetch_confirmed_payments(provider).await?;
        let mut report = ProviderReconciliation { provider: Some(provider), ..Default::default() };
        if queue.is_empty() {
            trace!("🔄️📒️ [{provider}] Nothing to reconcile");
            return Ok(report);
        }
        debug!("🔄️📒️ [{provider}] {} confirmed payments to reconcile", queue.len());
        for (campaign_id, payments) in group_by_campaign(queue) {
            match self.db.merge_confirmed_payments(&campaign_id, &payments).await {
                Ok(result) => {
                    report.merged += result.merged_count();
                    report.duplicates += result.duplicates.len();
                    report.failures.extend(result.failed.iter().cloned());
                    report.campaigns.push(campaign_id);
                    if !result.merged.is_empty() {
                        self.call_donations_merged_hook(provider, result).await;
                    }
                },
                Err(e) => {
                    error!("🔄️📒️ [{provider}] Could not reconcile campaign {campaign_id}. Will retry next run. {e}");
                    report.failures.extend(payments.iter().map(|p| MergeFailure {
                        provider,
                        reference: p.reference.clone(),
                        reason: e.to_string(),
                    }));
                },
            }
        }
        info!(
            "🔄️📒️ [{provider}] Reconciliation complete. {} merged, {} duplicates, {} failed across {} campaigns",
            report.merged,
            report.duplicates,
            report.failed(),
            report.campaigns.len()
        );
        Ok(report)
    }

    async fn call_donations_merged_hook(&self, provider: Provider, result: MergeResult) {
        let event = DonationsMergedEvent {
            provider,
            campaign_id: result.campaign_id,
            donations: result.merged,
            counters: result.counters,
        };
        for emitter in &self.producers.donations_merged_producer {
            debug!("🔄️📒️ Notifying donations merged hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

/// Groups the queue by campaign, keeping queue order within each campaign.
fn group_by_campaign(queue: Vec<ConfirmedPayment>) -> BTreeMap<String, Vec<ConfirmedPayment>> {
    queue.into_iter().fold(BTreeMap::new(), |mut groups, payment| {
        groups.entry(payment.campaign_id().to_string()).or_insert_with(Vec::new).push(payment);
        groups
    })
}
