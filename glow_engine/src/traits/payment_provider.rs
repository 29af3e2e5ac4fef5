use std::net::IpAddr;

use thiserror::Error;

use crate::db_types::{CacheEntry, CampaignSettings, DonationPayload, Provider, ProviderEvidence};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("The client is blacklisted by the payment provider")]
    Blacklisted,
    #[error("The campaign is not configured for {0}: {1}")]
    NotConfigured(Provider, String),
    #[error("Could not reach the payment provider: {0}")]
    Unavailable(String),
    #[error("The payment provider sent an unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub provider: Provider,
    /// The reference to register the payment under. Payconiq payments carry a locally generated reference; Pay.nl
    /// issues its own, so this is `None` for Pay.nl.
    pub reference: Option<String>,
    pub payload: DonationPayload,
    pub client_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPayment {
    /// The reference the provider will quote in its notifications
    pub reference: String,
    /// The id to query the provider's status endpoint with
    pub provider_payment_id: String,
    /// Where the donor should be sent to complete the payment
    pub checkout_url: String,
}

/// The seam between the engine and the external payment providers.
#[allow(async_fn_in_trait)]
pub trait PaymentProviderGateway: Clone {
    /// Registers a new payment at the provider.
    async fn create_payment(
        &self,
        request: &PaymentRequest,
        settings: &CampaignSettings,
    ) -> Result<CreatedPayment, ProviderError>;

    /// Asks the provider for the authoritative status of the payment behind the cache entry. This is the only source
    /// of truth for confirmation decisions; webhook payloads are never trusted.
    async fn verify_payment(
        &self,
        entry: &CacheEntry,
        settings: &CampaignSettings,
    ) -> Result<ProviderEvidence, ProviderError>;
}
