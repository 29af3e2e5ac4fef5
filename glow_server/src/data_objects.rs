use std::fmt::Display;

use glow_engine::db_types::{CampaignSettings, PaymentState, Provider};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Query parameters of the donation list. Missing values fall back to the first page of 20.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    pub offset: Option<i64>,
    pub page_size: Option<i64>,
}

/// The query string of a Pay.nl exchange call, e.g. `?order_id=2116843980X42870&orderStatusId=100`. Only the order id
/// is used; the status is always fetched from Pay.nl itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayNlExchangeParams {
    pub order_id: Option<String>,
    #[serde(rename = "orderStatusId")]
    pub order_status_id: Option<String>,
}

/// The JSON body of a Payconiq callback. Only the reference is used; the status is always fetched from Payconiq itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayconiqCallback {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub provider: Provider,
    pub reference: String,
    pub state: PaymentState,
}

/// Campaign payment settings as submitted on the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSettingsRequest {
    pub campaign_id: String,
    pub payment_method: Provider,
    #[serde(default)]
    pub paynl_service_id: Option<String>,
    #[serde(default)]
    pub payconiq_api_key: Option<String>,
    #[serde(default)]
    pub allow_anonymous: bool,
    #[serde(default)]
    pub custom_url: Option<String>,
}

impl From<CampaignSettingsRequest> for CampaignSettings {
    fn from(req: CampaignSettingsRequest) -> Self {
        let mut settings =
            CampaignSettings::new(req.campaign_id.trim(), req.payment_method).with_anonymous_donations(req.allow_anonymous);
        if let Some(id) = req.paynl_service_id.filter(|s| !s.trim().is_empty()) {
            settings = settings.with_paynl_service_id(id.trim());
        }
        if let Some(key) = req.payconiq_api_key.filter(|s| !s.trim().is_empty()) {
            settings = settings.with_payconiq_api_key(key.trim());
        }
        if let Some(url) = req.custom_url.filter(|s| !s.trim().is_empty()) {
            settings = settings.with_custom_url(url.trim());
        }
        settings
    }
}
