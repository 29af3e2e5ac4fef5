use thiserror::Error;

use crate::db_types::CampaignSettings;

#[derive(Debug, Clone, Error)]
pub enum CampaignSettingsError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid campaign settings. {0}")]
    InvalidSettings(String),
}

impl From<sqlx::Error> for CampaignSettingsError {
    fn from(e: sqlx::Error) -> Self {
        CampaignSettingsError::DatabaseError(e.to_string())
    }
}

/// Access to the payment settings of each campaign.
///
/// Campaign creation and the rest of the campaign record are managed by an external system. The engine only needs to
/// know which provider a campaign uses, and the credentials for that provider.
#[allow(async_fn_in_trait)]
pub trait CampaignManagement {
    async fn fetch_campaign_settings(&self, campaign_id: &str)
        -> Result<Option<CampaignSettings>, CampaignSettingsError>;

    /// Inserts the settings, or replaces the existing settings for the campaign.
    async fn upsert_campaign_settings(&self, settings: CampaignSettings) -> Result<(), CampaignSettingsError>;
}
