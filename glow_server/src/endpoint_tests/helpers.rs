use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use glow_common::Amount;
use glow_engine::db_types::{
    CacheEntry,
    CampaignSettings,
    ConfirmedPayment,
    DonationPayload,
    DonationRecord,
    Provider,
    ProviderEvidence,
    Shard,
};
use log::debug;
use sqlx::types::Json;

pub const ADMIN_TOKEN: &str = "kaars-admin-0001";

/// Sends the request to an app configured by `configure`, and returns the status and body. Errors raised by middleware
/// are rendered into their response, the way the HTTP server would.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub async fn post_json<F>(path: &str, body: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_json(body), configure).await
}

pub fn paynl_settings() -> CampaignSettings {
    CampaignSettings::new("lichtjes-gent", Provider::PayNl).with_paynl_service_id("SL-1234-5678")
}

pub fn payconiq_settings() -> CampaignSettings {
    CampaignSettings::new("kaarsjes-brugge", Provider::Payconiq).with_payconiq_api_key("52989c01-9fc3-47b0")
}

pub fn payload(campaign_id: &str, name: &str, euros: i64) -> DonationPayload {
    DonationPayload {
        campaign_id: campaign_id.to_string(),
        name: name.to_string(),
        description: "Voor oma".to_string(),
        lat: 51.05,
        lng: 3.72,
        amount: Amount::from_euros(euros),
        email: Some("donor@example.com".to_string()),
        anonymous: false,
        language: Some("nl-BE".to_string()),
    }
}

pub fn cache_entry(provider: Provider, reference: &str, provider_payment_id: &str, payload: DonationPayload) -> CacheEntry {
    CacheEntry {
        provider,
        reference: reference.to_string(),
        provider_payment_id: provider_payment_id.to_string(),
        payload,
        created_at: Utc.with_ymd_and_hms(2024, 11, 1, 19, 12, 44).unwrap(),
    }
}

pub fn record(number: i64, name: &str, euros: i64, day: u32) -> DonationRecord {
    DonationRecord {
        number,
        name: name.to_string(),
        description: String::new(),
        lat: 51.0 + number as f64 / 100.0,
        lng: 3.7,
        amount: Amount::from_euros(euros),
        date: Utc.with_ymd_and_hms(2024, 11, day, 20, 0, 0).unwrap(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        provider: Provider::PayNl,
        reference: format!("EX-{number:04}"),
        anonymous: false,
    }
}

pub fn shard(campaign_id: &str, records: Vec<DonationRecord>) -> Shard {
    Shard { campaign_id: campaign_id.to_string(), shard_index: 0, candles: Json(records) }
}

pub fn confirmed(provider: Provider, reference: &str, payload: DonationPayload, evidence: ProviderEvidence) -> ConfirmedPayment {
    let at = Utc.with_ymd_and_hms(2024, 11, 1, 19, 14, 2).unwrap();
    ConfirmedPayment {
        id: 1,
        provider,
        reference: reference.to_string(),
        provider_payment_id: reference.to_string(),
        payload,
        evidence: Json(evidence),
        created_at: at,
        confirmed_at: at,
    }
}
