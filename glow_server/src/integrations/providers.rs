//! The engine's [`PaymentProviderGateway`], backed by the Pay.nl and Payconiq REST clients.
use std::time::Duration;

use glow_common::EURO_CURRENCY_CODE;
use glow_engine::{
    db_types::{CacheEntry, CampaignSettings, Provider, ProviderEvidence},
    traits::{CreatedPayment, PaymentRequest},
    PaymentProviderGateway,
    ProviderError,
};
use glow_providers::{
    PayNlApi,
    PayNlEndUser,
    PayNlTransactionRequest,
    PayconiqApi,
    PayconiqPaymentRequest,
    ProviderApiError,
    ProviderConfig,
    RestClient,
};
use log::*;

#[derive(Clone)]
pub struct ProviderClients {
    config: ProviderConfig,
    paynl: PayNlApi,
    payconiq: PayconiqApi,
}

impl ProviderClients {
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        let rest = RestClient::new(timeout)?;
        let paynl = PayNlApi::new(config.paynl.clone(), rest.clone());
        let payconiq = PayconiqApi::new(config.payconiq.clone(), rest);
        Ok(Self { config, paynl, payconiq })
    }

    fn description(campaign_id: &str) -> String {
        format!("Donatie voor {campaign_id}")
    }

    async fn create_paynl_payment(
        &self,
        request: &PaymentRequest,
        settings: &CampaignSettings,
    ) -> Result<CreatedPayment, ProviderError> {
        let service_id = settings
            .paynl_service_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(Provider::PayNl, "no service id".into()))?;
        let payload = &request.payload;
        let paynl_request = PayNlTransactionRequest {
            service_id,
            amount: payload.amount,
            ip_address: request.client_ip.map(|ip| ip.to_string()).unwrap_or_default(),
            finish_url: self.config.success_url(&settings.campaign_id, settings.custom_url.as_deref()),
            exchange_url: self.paynl.config().exchange_url.clone(),
            description: Self::description(&settings.campaign_id),
            test_mode: self.paynl.config().test_mode,
            end_user: PayNlEndUser::new(&payload.name, payload.email.as_deref(), payload.language.as_deref()),
        };
        let tx = self.paynl.start_transaction(&paynl_request).await.map_err(|e| provider_error(Provider::PayNl, e))?;
        Ok(CreatedPayment {
            reference: tx.transaction_id.clone(),
            provider_payment_id: tx.transaction_id,
            checkout_url: tx.payment_url,
        })
    }

    async fn create_payconiq_payment(
        &self,
        request: &PaymentRequest,
        settings: &CampaignSettings,
    ) -> Result<CreatedPayment, ProviderError> {
        let api_key = settings
            .payconiq_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(Provider::Payconiq, "no API key".into()))?;
        let reference = request
            .reference
            .clone()
            .ok_or_else(|| ProviderError::Rejected("Payconiq payments need a reference".into()))?;
        let success_url = self.config.success_url(&settings.campaign_id, settings.custom_url.as_deref());
        let payconiq_request = PayconiqPaymentRequest {
            amount: request.payload.amount.cents(),
            currency: EURO_CURRENCY_CODE.to_string(),
            callback_url: self.payconiq.config().callback_url.clone(),
            description: Self::description(&settings.campaign_id),
            reference: reference.clone(),
            return_url: format!("{success_url}?orderId={reference}&paymentMethod=payconiq"),
        };
        let payment = self
            .payconiq
            .create_payment(&api_key, &payconiq_request)
            .await
            .map_err(|e| provider_error(Provider::Payconiq, e))?;
        let checkout_url = payment
            .checkout_url()
            .map(String::from)
            .ok_or_else(|| ProviderError::InvalidResponse("Payconiq did not return a checkout link".into()))?;
        Ok(CreatedPayment { reference, provider_payment_id: payment.payment_id, checkout_url })
    }
}

impl PaymentProviderGateway for ProviderClients {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
        settings: &CampaignSettings,
    ) -> Result<CreatedPayment, ProviderError> {
        match request.provider {
            Provider::PayNl => self.create_paynl_payment(request, settings).await,
            Provider::Payconiq => self.create_payconiq_payment(request, settings).await,
        }
    }

    async fn verify_payment(
        &self,
        entry: &CacheEntry,
        settings: &CampaignSettings,
    ) -> Result<ProviderEvidence, ProviderError> {
        match entry.provider {
            Provider::PayNl => {
                let details = self
                    .paynl
                    .transaction_status(&entry.provider_payment_id)
                    .await
                    .map_err(|e| provider_error(Provider::PayNl, e))?;
                Ok(ProviderEvidence::PayNl {
                    transaction_id: details.transaction_id,
                    state: details.state,
                    state_name: details.state_name,
                    amount_paid: details.amount_paid.and_then(|a| a.as_amount()),
                })
            },
            Provider::Payconiq => {
                let api_key = settings
                    .payconiq_api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| ProviderError::NotConfigured(Provider::Payconiq, "no API key".into()))?;
                let payment = self
                    .payconiq
                    .get_payment(&api_key, &entry.provider_payment_id)
                    .await
                    .map_err(|e| provider_error(Provider::Payconiq, e))?;
                Ok(ProviderEvidence::Payconiq {
                    amount: payment.amount(),
                    payment_id: payment.payment_id,
                    status: payment.status,
                })
            },
        }
    }
}

fn provider_error(provider: Provider, e: ProviderApiError) -> ProviderError {
    debug!("[{provider}] Provider API call failed. {e}");
    match e {
        ProviderApiError::Blacklisted => ProviderError::Blacklisted,
        ProviderApiError::Refused { code, message } => ProviderError::Rejected(format!("[{code}] {message}")),
        ProviderApiError::MissingCredentials(what) => ProviderError::NotConfigured(provider, what),
        e if e.is_transient() => ProviderError::Unavailable(e.to_string()),
        e => ProviderError::InvalidResponse(e.to_string()),
    }
}
