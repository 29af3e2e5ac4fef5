use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The provider refused the request. [{code}] {message}")]
    Refused { code: String, message: String },
    #[error("The provider blacklisted the client")]
    Blacklisted,
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl ProviderApiError {
    /// True when the failure came from the network or the provider's availability, rather than from the content of the
    /// request.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderApiError::RestResponseError(_) => true,
            ProviderApiError::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
