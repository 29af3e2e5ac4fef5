//! An in-memory stand-in for the payment providers, for exercising the payment flows without network access.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use crate::{
    db_types::{CacheEntry, CampaignSettings, Provider, ProviderEvidence},
    traits::{CreatedPayment, PaymentProviderGateway, PaymentRequest, ProviderError},
};

#[derive(Clone, Default)]
pub struct FakeGateway {
    /// Provider status keyed by provider payment id. Unknown ids are reported as pending.
    statuses: Arc<Mutex<HashMap<String, String>>>,
    blacklisted: Arc<Mutex<bool>>,
    delay: Arc<Mutex<Option<Duration>>>,
    created: Arc<AtomicUsize>,
    verifications: Arc<AtomicUsize>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw provider status, e.g. "100" for Pay.nl or "SUCCEEDED" for Payconiq.
    pub fn set_status(&self, payment_id: &str, status: &str) {
        if let Ok(mut map) = self.statuses.lock() {
            map.insert(payment_id.to_string(), status.to_string());
        }
    }

    pub fn set_blacklisted(&self, blacklisted: bool) {
        if let Ok(mut b) = self.blacklisted.lock() {
            *b = blacklisted;
        }
    }

    /// Makes every status query take at least `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut d) = self.delay.lock() {
            *d = delay;
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn verification_count(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    fn status_of(&self, payment_id: &str) -> Option<String> {
        self.statuses.lock().ok().and_then(|m| m.get(payment_id).cloned())
    }
}

impl PaymentProviderGateway for FakeGateway {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
        _settings: &CampaignSettings,
    ) -> Result<CreatedPayment, ProviderError> {
        if self.blacklisted.lock().map(|b| *b).unwrap_or(false) {
            return Err(ProviderError::Blacklisted);
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let (reference, provider_payment_id) = match (request.provider, &request.reference) {
            (Provider::Payconiq, Some(r)) => (r.clone(), format!("pcq-{n}")),
            (Provider::Payconiq, None) => return Err(ProviderError::Rejected("A reference is required".into())),
            (Provider::PayNl, _) => {
                let id = format!("EX-{n:04}-0000-0000");
                (id.clone(), id)
            },
        };
        Ok(CreatedPayment {
            checkout_url: format!("https://checkout.example.com/{provider_payment_id}"),
            reference,
            provider_payment_id,
        })
    }

    async fn verify_payment(
        &self,
        entry: &CacheEntry,
        _settings: &CampaignSettings,
    ) -> Result<ProviderEvidence, ProviderError> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let id = entry.provider_payment_id.clone();
        let evidence = match entry.provider {
            Provider::PayNl => {
                let state = self.status_of(&id).unwrap_or_else(|| "20".to_string());
                ProviderEvidence::PayNl {
                    transaction_id: id,
                    state_name: state.clone(),
                    state,
                    amount_paid: Some(entry.payload.amount),
                }
            },
            Provider::Payconiq => {
                let status = self.status_of(&id).unwrap_or_else(|| "PENDING".to_string());
                ProviderEvidence::Payconiq { payment_id: id, status, amount: Some(entry.payload.amount) }
            },
        };
        Ok(evidence)
    }
}
