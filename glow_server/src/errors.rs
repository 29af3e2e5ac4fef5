use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use glow_engine::{LedgerError, PaymentFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The record already exists. {0}")]
    AlreadyExists(String),
    #[error("The payment provider could not be reached. {0}")]
    ProviderUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::InvalidArgument(s) => Self::InvalidRequestBody(s),
            PaymentFlowError::AlreadyExists(provider, reference) => {
                Self::AlreadyExists(format!("{provider} payment {reference}"))
            },
            PaymentFlowError::NotFound(s) => Self::NoRecordFound(s),
            PaymentFlowError::PermissionDenied(s) => Self::InsufficientPermissions(s),
            PaymentFlowError::DatabaseError(s) => {
                error!("💻️ Database error while handling a request. {s}");
                Self::BackendError("Database error".into())
            },
            e @ PaymentFlowError::ProviderError(_) | e @ PaymentFlowError::VerificationTimeout(_) => {
                Self::ProviderUnavailable(e.to_string())
            },
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        PaymentFlowError::from(e).into()
    }
}

#[cfg(test)]
mod test {
    use glow_engine::{db_types::Provider, ProviderError};

    use super::*;

    #[test]
    fn engine_errors_map_to_status_codes() {
        let cases = [
            (PaymentFlowError::InvalidArgument("name".into()), StatusCode::BAD_REQUEST),
            (PaymentFlowError::AlreadyExists(Provider::PayNl, "EX-1".into()), StatusCode::CONFLICT),
            (PaymentFlowError::NotFound("Campaign x".into()), StatusCode::NOT_FOUND),
            (PaymentFlowError::PermissionDenied("blacklisted".into()), StatusCode::FORBIDDEN),
            (PaymentFlowError::DatabaseError("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (PaymentFlowError::ProviderError(ProviderError::Unavailable("down".into())), StatusCode::BAD_GATEWAY),
            (PaymentFlowError::VerificationTimeout(10), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
    }

    #[test]
    fn database_details_are_not_leaked() {
        let err = ServerError::from(PaymentFlowError::DatabaseError("no such table: ledger_shards".into()));
        assert!(!err.to_string().contains("ledger_shards"));
    }
}
