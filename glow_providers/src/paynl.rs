use log::*;

use crate::{
    api::RestClient,
    config::PayNlConfig,
    data_objects::{PayNlPaymentDetails, PayNlStartResponse, PayNlStatusResponse, PayNlTransaction, PayNlTransactionRequest},
    ProviderApiError,
};

/// Client for the Pay.nl transaction REST API.
#[derive(Clone)]
pub struct PayNlApi {
    config: PayNlConfig,
    rest: RestClient,
}

impl PayNlApi {
    pub fn new(config: PayNlConfig, rest: RestClient) -> Self {
        Self { config, rest }
    }

    pub fn config(&self) -> &PayNlConfig {
        &self.config
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ProviderApiError> {
        let (user, pass) =
            self.config.credentials().ok_or_else(|| ProviderApiError::MissingCredentials("Pay.nl API token".into()))?;
        Ok(req.basic_auth(user, pass))
    }

    /// Starts a transaction. A refused request or a blacklisted client is an error; otherwise the new transaction id
    /// and payment URL are returned.
    pub async fn start_transaction(
        &self,
        request: &PayNlTransactionRequest,
    ) -> Result<PayNlTransaction, ProviderApiError> {
        debug!("Starting Pay.nl transaction of {} for service {}", request.amount, request.service_id);
        let req = self.authorized(self.rest.client().post(&self.config.api_url))?.form(&request.to_form());
        let response = self.rest.rest_query::<PayNlStartResponse>(req).await?;
        if !response.request.is_success() {
            warn!("Pay.nl refused the transaction. [{}] {}", response.request.error_id, response.request.error_message);
            return Err(ProviderApiError::Refused {
                code: response.request.error_id,
                message: response.request.error_message,
            });
        }
        if response.is_blacklisted() {
            warn!("Pay.nl blacklisted the client at {}", request.ip_address);
            return Err(ProviderApiError::Blacklisted);
        }
        let tx = response
            .transaction
            .ok_or_else(|| ProviderApiError::RestResponseError("Pay.nl response carried no transaction".into()))?;
        info!("Started Pay.nl transaction {}", tx.transaction_id);
        Ok(tx)
    }

    /// Fetches the authoritative status of a transaction.
    pub async fn transaction_status(&self, transaction_id: &str) -> Result<PayNlPaymentDetails, ProviderApiError> {
        trace!("Fetching Pay.nl status for {transaction_id}");
        let req = self
            .authorized(self.rest.client().post(&self.config.status_url))?
            .query(&[("transactionId", transaction_id)]);
        let response = self.rest.rest_query::<PayNlStatusResponse>(req).await?;
        if !response.request.is_success() {
            return Err(ProviderApiError::Refused {
                code: response.request.error_id,
                message: response.request.error_message,
            });
        }
        let details = response
            .payment_details
            .ok_or_else(|| ProviderApiError::RestResponseError("Pay.nl response carried no payment details".into()))?;
        debug!("Pay.nl transaction {transaction_id} is in state {} ({})", details.state, details.state_name);
        Ok(details)
    }
}
