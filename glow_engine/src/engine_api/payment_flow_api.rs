use std::{fmt::Debug, net::IpAddr, time::Duration};

use glow_common::Amount;
use log::*;

use crate::{
    db_types::{CampaignSettings, DonationPayload, NewCacheEntry, PaymentState, PaymentStatus, Provider},
    engine_api::{
        donation_objects::{
            DonationRequest,
            InitiatedDonation,
            NotificationOutcome,
            MAXIMUM_DONATION_EUROS,
            MAX_DESCRIPTION_LENGTH,
            MAX_NAME_LENGTH,
            MINIMUM_DONATION_EUROS,
        },
        errors::PaymentFlowError,
    },
    events::{EventProducers, PaymentConfirmedEvent},
    helpers::{is_valid_reference, new_payment_reference, truncate_field},
    traits::{PaymentCacheManagement, PaymentProviderGateway, PaymentRequest, ProviderError},
};

pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// `PaymentFlowApi` handles the first half of a donation's life: creating the payment at the provider, and handling
/// the provider's confirmation notifications.
///
/// Notifications are never trusted. Every notification triggers a status query at the provider, and only the
/// provider's answer decides whether the cached donation moves into the confirmed queue.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    verification_timeout: Duration,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, verification_timeout: DEFAULT_VERIFICATION_TIMEOUT }
    }

    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    /// Starts a new donation: validates and normalises the request, creates the payment at the campaign's provider and
    /// caches the donation until the provider confirms it.
    pub async fn initiate_donation(
        &self,
        request: DonationRequest,
        client_ip: Option<IpAddr>,
    ) -> Result<InitiatedDonation, PaymentFlowError> {
        let campaign_id = request.campaign_id.trim().to_string();
        if campaign_id.is_empty() {
            return Err(PaymentFlowError::InvalidArgument("A campaign is required".into()));
        }
        let settings = self
            .db
            .fetch_campaign_settings(&campaign_id)
            .await?
            .ok_or_else(|| PaymentFlowError::NotFound(format!("Campaign {campaign_id}")))?;
        let payload = normalise_request(request, &settings)?;
        let provider = settings.payment_method;
        let reference = match provider {
            Provider::Payconiq => Some(new_payment_reference()),
            Provider::PayNl => None,
        };
        let payment_request = PaymentRequest { provider, reference, payload: payload.clone(), client_ip };
        let created = self.gateway.create_payment(&payment_request, &settings).await.map_err(|e| match e {
            ProviderError::Blacklisted => {
                warn!("🔄️💳️ {provider} refused a donation to {campaign_id} from a blacklisted client");
                PaymentFlowError::PermissionDenied("The payment provider refused this payment".into())
            },
            e => e.into(),
        })?;
        let entry = NewCacheEntry::new(provider, created.reference.clone(), created.provider_payment_id, payload);
        self.db.insert_cache_entry(entry).await?;
        info!("🔄️💳️ [{provider}] Donation {} to {campaign_id} initiated", created.reference);
        Ok(InitiatedDonation { provider, reference: created.reference, checkout_url: created.checkout_url })
    }

    /// Handles a provider notification for `reference`.
    ///
    /// Safe to call any number of times for the same reference: once the cache entry has been promoted (or removed),
    /// further calls return [`NotificationOutcome::AlreadyProcessed`] without contacting the provider.
    ///
    /// Provider errors and timeouts are returned as errors and leave the cache untouched, so that the provider's retry
    /// can try again.
    pub async fn handle_notification(
        &self,
        provider: Provider,
        reference: &str,
    ) -> Result<NotificationOutcome, PaymentFlowError> {
        if !is_valid_reference(reference) {
            return Err(PaymentFlowError::InvalidArgument(format!("'{reference}' is not a valid payment reference")));
        }
        let entry = match self.db.fetch_cache_entry(provider, reference).await? {
            Some(entry) => entry,
            None => {
                debug!("🔄️✅️ [{provider}] {reference} is not in the cache. Treating the notification as handled.");
                return Ok(NotificationOutcome::AlreadyProcessed);
            },
        };
        let campaign_id = entry.payload.campaign_id.clone();
        let settings = self.db.fetch_campaign_settings(&campaign_id).await?.ok_or_else(|| {
            error!("🔄️✅️ [{provider}] {reference} belongs to campaign {campaign_id}, which has no payment settings");
            PaymentFlowError::NotFound(format!("Campaign {campaign_id}"))
        })?;
        let timeout = self.verification_timeout;
        let evidence = tokio::time::timeout(timeout, self.gateway.verify_payment(&entry, &settings))
            .await
            .map_err(|_| {
                warn!("🔄️✅️ [{provider}] Status query for {reference} timed out after {}s", timeout.as_secs());
                PaymentFlowError::VerificationTimeout(timeout.as_secs())
            })??;
        if evidence.provider() != provider {
            return Err(ProviderError::InvalidResponse(format!(
                "Asked {provider} about {reference}, but the answer came from {}",
                evidence.provider()
            ))
            .into());
        }
        let status_name = evidence.status_name();
        match evidence.status() {
            PaymentStatus::Succeeded => match self.db.promote_to_confirmed(provider, reference, evidence).await? {
                Some(payment) => {
                    info!(
                        "🔄️✅️ [{provider}] {reference} confirmed: {} to {campaign_id}. Queued for reconciliation.",
                        payment.amount()
                    );
                    self.call_payment_confirmed_hook(&PaymentConfirmedEvent::new(payment.clone())).await;
                    Ok(NotificationOutcome::Confirmed(payment))
                },
                None => {
                    debug!("🔄️✅️ [{provider}] {reference} was promoted by a concurrent notification");
                    Ok(NotificationOutcome::AlreadyProcessed)
                },
            },
            PaymentStatus::Pending => {
                debug!("🔄️⏳️ [{provider}] {reference} is still pending ({status_name})");
                Ok(NotificationOutcome::Pending)
            },
            PaymentStatus::Failed => {
                info!("🔄️❌️ [{provider}] {reference} did not complete ({status_name}). Removing it from the cache.");
                self.db.remove_cache_entry(provider, reference).await?;
                Ok(NotificationOutcome::Rejected(status_name))
            },
        }
    }

    async fn call_payment_confirmed_hook(&self, event: &PaymentConfirmedEvent) {
        for emitter in &self.producers.payment_confirmed_producer {
            debug!("🔄️✅️ Notifying payment confirmed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    /// Where in the pipeline the payment currently is. Used by the front end to poll for completion.
    pub async fn payment_state(&self, provider: Provider, reference: &str) -> Result<PaymentState, PaymentFlowError> {
        if !is_valid_reference(reference) {
            return Err(PaymentFlowError::InvalidArgument(format!("'{reference}' is not a valid payment reference")));
        }
        let state = self.db.fetch_payment_state(provider, reference).await?;
        Ok(state)
    }

    /// Registers (or replaces) the payment settings of a campaign.
    pub async fn register_campaign(&self, settings: CampaignSettings) -> Result<(), PaymentFlowError> {
        match settings.payment_method {
            Provider::PayNl if settings.paynl_service_id.as_deref().map_or(true, str::is_empty) => {
                return Err(PaymentFlowError::InvalidArgument("Pay.nl campaigns need a service id".into()));
            },
            Provider::Payconiq if settings.payconiq_api_key.as_ref().map_or(true, |k| k.is_empty()) => {
                return Err(PaymentFlowError::InvalidArgument("Payconiq campaigns need an API key".into()));
            },
            _ => {},
        }
        let id = settings.campaign_id.clone();
        self.db.upsert_campaign_settings(settings).await?;
        info!("🔄️ Payment settings for campaign {id} registered");
        Ok(())
    }
}

/// Validates the donation request and applies the donation rules: names are cut to 50 characters and descriptions to
/// 140, amounts are rounded to whole euros with a minimum of €5, and donations are only anonymous if the campaign
/// allows it.
pub fn normalise_request(
    request: DonationRequest,
    settings: &CampaignSettings,
) -> Result<DonationPayload, PaymentFlowError> {
    let campaign_id = request.campaign_id.trim().to_string();
    if campaign_id.is_empty() {
        return Err(PaymentFlowError::InvalidArgument("A campaign is required".into()));
    }
    let name = truncate_field(&request.name, MAX_NAME_LENGTH);
    if name.is_empty() {
        return Err(PaymentFlowError::InvalidArgument("A name is required".into()));
    }
    let (lat, lng) = match (request.lat, request.lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
        _ => return Err(PaymentFlowError::InvalidArgument("A location is required".into())),
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(PaymentFlowError::InvalidArgument(format!("({lat}, {lng}) is not a valid location")));
    }
    let euros = match request.amount {
        Some(a) if a.is_finite() && a > 0.0 => a.max(MINIMUM_DONATION_EUROS as f64).round(),
        _ => return Err(PaymentFlowError::InvalidArgument("A positive amount is required".into())),
    };
    if euros > MAXIMUM_DONATION_EUROS as f64 {
        return Err(PaymentFlowError::InvalidArgument(format!("Donations are limited to €{MAXIMUM_DONATION_EUROS}")));
    }
    let amount = Amount::try_from(euros).map_err(|e| PaymentFlowError::InvalidArgument(e.to_string()))?;
    let description = request.description.map(|d| truncate_field(&d, MAX_DESCRIPTION_LENGTH)).unwrap_or_default();
    let email = request.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    let language = request.language.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
    let anonymous = request.anonymous && settings.allow_anonymous;
    Ok(DonationPayload { campaign_id, name, description, lat, lng, amount, email, anonymous, language })
}
