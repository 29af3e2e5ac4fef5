use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    RequestBuilder,
};
use serde::de::DeserializeOwned;

use crate::ProviderApiError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A thin wrapper around a shared `reqwest` client that turns provider responses into typed results.
#[derive(Clone)]
pub struct RestClient {
    client: Arc<Client>,
}

impl RestClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { client: Arc::new(client) })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends the request and deserializes a successful response body. Non-2xx responses become
    /// [`ProviderApiError::QueryError`] carrying the provider's response text.
    pub async fn rest_query<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ProviderApiError> {
        let response = req.send().await.map_err(|e| ProviderApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ProviderApiError::RestResponseError(e.to_string()))?;
        if status.is_success() {
            trace!("REST query successful. {status}");
            serde_json::from_str::<T>(&text).map_err(|e| ProviderApiError::JsonError(format!("{e}. Body: {text}")))
        } else {
            debug!("REST query failed. {status}: {text}");
            Err(ProviderApiError::QueryError { status: status.as_u16(), message: text })
        }
    }
}
