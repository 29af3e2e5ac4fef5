use glow_common::Secret;
use log::*;

use crate::{
    api::RestClient,
    config::PayconiqConfig,
    data_objects::{PayconiqPayment, PayconiqPaymentRequest},
    ProviderApiError,
};

/// Client for the Payconiq v3 payments API. Every campaign has its own merchant API key, so the key is passed per
/// call rather than configured on the client.
#[derive(Clone)]
pub struct PayconiqApi {
    config: PayconiqConfig,
    rest: RestClient,
}

impl PayconiqApi {
    pub fn new(config: PayconiqConfig, rest: RestClient) -> Self {
        Self { config, rest }
    }

    pub fn config(&self) -> &PayconiqConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn create_payment(
        &self,
        api_key: &Secret<String>,
        request: &PayconiqPaymentRequest,
    ) -> Result<PayconiqPayment, ProviderApiError> {
        if api_key.is_empty() {
            return Err(ProviderApiError::MissingCredentials("Payconiq API key".into()));
        }
        debug!("Creating Payconiq payment {} with key {}", request.reference, api_key.hint(5));
        let req = self.rest.client().post(self.url("/v3/payments")).bearer_auth(api_key.reveal()).json(request);
        let payment = self.rest.rest_query::<PayconiqPayment>(req).await?;
        info!("Created Payconiq payment {} for reference {}", payment.payment_id, request.reference);
        Ok(payment)
    }

    pub async fn get_payment(
        &self,
        api_key: &Secret<String>,
        payment_id: &str,
    ) -> Result<PayconiqPayment, ProviderApiError> {
        if api_key.is_empty() {
            return Err(ProviderApiError::MissingCredentials("Payconiq API key".into()));
        }
        trace!("Fetching Payconiq payment {payment_id}");
        let req = self.rest.client().get(self.url(&format!("/v3/payments/{payment_id}"))).bearer_auth(api_key.reveal());
        let payment = self.rest.rest_query::<PayconiqPayment>(req).await?;
        debug!("Payconiq payment {payment_id} has status {}", payment.status);
        Ok(payment)
    }
}
