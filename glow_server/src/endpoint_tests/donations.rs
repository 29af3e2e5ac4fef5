use actix_web::{http::StatusCode, web, web::ServiceConfig};
use glow_engine::{
    db_types::{CacheEntry, Provider},
    events::EventProducers,
    test_utils::fake_gateway::FakeGateway,
    LedgerApi,
    PaymentFlowApi,
};
use serde_json::{json, Value};

use super::helpers::{get_request, paynl_settings, post_json, record, shard};
use crate::{
    config::ServerOptions,
    endpoint_tests::mocks::MockStore,
    routes::{health, CountersRoute, DonateRoute, DonationsRoute, LatestDonationRoute, PaymentStatusRoute},
};

const CAMPAIGN: &str = "lichtjes-gent";

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn list_donations_newest_first() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&format!("/campaigns/{CAMPAIGN}/donations?offset=1&page_size=1"), configure_ledger).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["locations"].as_array().unwrap().len(), 3);
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["number"], 2);
    assert_eq!(data[0]["name"], "Bram");
}

#[actix_web::test]
async fn latest_donation() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&format!("/campaigns/{CAMPAIGN}/donations/latest"), configure_ledger).await;
    assert_eq!(status, StatusCode::OK);
    let latest: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(latest["number"], 3);
    assert_eq!(latest["name"], "Carla");
}

#[actix_web::test]
async fn latest_donation_of_an_empty_campaign_is_null() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/campaigns/nieuw/donations/latest", |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_shards().returning(|_| Ok(vec![]));
        cfg.service(LatestDonationRoute::<MockStore>::new()).app_data(web::Data::new(LedgerApi::new(store)));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[actix_web::test]
async fn counters_of_an_unknown_campaign_are_zero() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/campaigns/nieuw/counters", |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_counters().returning(|_| Ok(None));
        cfg.service(CountersRoute::<MockStore>::new()).app_data(web::Data::new(LedgerApi::new(store)));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let counters: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(counters["campaign_id"], "nieuw");
    assert_eq!(counters["total"], 0);
}

#[actix_web::test]
async fn donate_returns_the_checkout_url() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    let g = gateway.clone();
    let (status, body) = post_json("/donations", donation_body(CAMPAIGN), move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(paynl_settings())));
        store.expect_insert_cache_entry().times(1).returning(|entry| {
            assert_eq!(entry.payload.name, "Lotte");
            Ok(CacheEntry {
                provider: entry.provider,
                reference: entry.reference,
                provider_payment_id: entry.provider_payment_id,
                payload: entry.payload,
                created_at: entry.created_at,
            })
        });
        configure_flow(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let donation: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(donation["provider"], "paynl");
    assert_eq!(donation["reference"], "EX-0001-0000-0000");
    assert_eq!(donation["checkout_url"], "https://checkout.example.com/EX-0001-0000-0000");
    assert_eq!(gateway.created_count(), 1);
}

#[actix_web::test]
async fn donate_to_an_unknown_campaign() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    let g = gateway.clone();
    let (status, body) = post_json("/donations", donation_body("bestaat-niet"), move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_campaign_settings().returning(|_| Ok(None));
        store.expect_insert_cache_entry().never();
        configure_flow(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Campaign bestaat-niet"}"#);
    assert_eq!(gateway.created_count(), 0);
}

#[actix_web::test]
async fn donate_without_a_location() {
    let _ = env_logger::try_init().ok();
    let mut body = donation_body(CAMPAIGN);
    body["lat"] = Value::Null;
    let (status, _) = post_json("/donations", body, |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(paynl_settings())));
        configure_flow(cfg, store, FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payments/paynl/EX-1234-5678-9012", |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_payment_state().returning(|provider, reference| {
            assert_eq!(provider, Provider::PayNl);
            assert_eq!(reference, "EX-1234-5678-9012");
            Ok(glow_engine::db_types::PaymentState::Confirmed)
        });
        configure_flow(cfg, store, FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"provider":"paynl","reference":"EX-1234-5678-9012","state":"Confirmed"}"#);
}

#[actix_web::test]
async fn payment_status_of_an_unknown_provider() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payments/paypal/EX-1234", |cfg| {
        configure_flow(cfg, MockStore::new(), FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unknown payment provider: paypal"));
}

fn donation_body(campaign_id: &str) -> Value {
    json!({
        "campaign_id": campaign_id,
        "name": "Lotte",
        "description": "Voor opa Staf",
        "lat": 51.21,
        "lng": 4.40,
        "amount": 10.0,
        "email": "lotte@example.com",
        "anonymous": false,
        "language": "nl-BE"
    })
}

fn configure_ledger(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_shards().returning(|campaign_id| {
        let records = vec![record(1, "Anke", 10, 3), record(2, "Bram", 5, 4), record(3, "Carla", 20, 5)];
        Ok(vec![shard(campaign_id, records)])
    });
    cfg.service(DonationsRoute::<MockStore>::new())
        .service(LatestDonationRoute::<MockStore>::new())
        .app_data(web::Data::new(LedgerApi::new(store)));
}

fn configure_flow(cfg: &mut ServiceConfig, store: MockStore, gateway: FakeGateway) {
    let api = PaymentFlowApi::new(store, gateway, EventProducers::default());
    cfg.service(DonateRoute::<MockStore, FakeGateway>::new())
        .service(PaymentStatusRoute::<MockStore, FakeGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(ServerOptions::default()));
}
