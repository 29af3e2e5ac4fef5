use thiserror::Error;

use crate::{
    db_types::Provider,
    traits::{CampaignSettingsError, LedgerError, PaymentCacheError, ProviderError},
};

/// Errors surfaced by the donation and payment confirmation flows.
#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Invalid argument. {0}")]
    InvalidArgument(String),
    #[error("Payment reference {1} already exists for {0}")]
    AlreadyExists(Provider, String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("Permission denied. {0}")]
    PermissionDenied(String),
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Payment provider error. {0}")]
    ProviderError(#[from] ProviderError),
    #[error("The payment provider did not answer within {0} seconds")]
    VerificationTimeout(u64),
}

impl From<PaymentCacheError> for PaymentFlowError {
    fn from(e: PaymentCacheError) -> Self {
        match e {
            PaymentCacheError::AlreadyExists(provider, reference) => Self::AlreadyExists(provider, reference),
            PaymentCacheError::DatabaseError(s) => Self::DatabaseError(s),
            PaymentCacheError::CampaignSettings(e) => e.into(),
        }
    }
}

impl From<CampaignSettingsError> for PaymentFlowError {
    fn from(e: CampaignSettingsError) -> Self {
        match e {
            CampaignSettingsError::DatabaseError(s) => Self::DatabaseError(s),
            CampaignSettingsError::InvalidSettings(s) => Self::InvalidArgument(s),
        }
    }
}

impl From<LedgerError> for PaymentFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::CampaignNotFound(c) => Self::NotFound(format!("Campaign {c}")),
            LedgerError::DonationNotFound { campaign_id, number } => {
                Self::NotFound(format!("Donation #{number} in campaign {campaign_id}"))
            },
            LedgerError::CorruptLedger(s) => Self::DatabaseError(s),
            LedgerError::InvalidUpdate(s) => Self::InvalidArgument(s),
        }
    }
}
