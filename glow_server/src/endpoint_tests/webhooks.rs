use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use glow_engine::{
    db_types::{Provider, ProviderEvidence},
    events::EventProducers,
    test_utils::fake_gateway::FakeGateway,
    PaymentCacheError,
    PaymentFlowApi,
};
use serde_json::json;

use super::helpers::{
    cache_entry,
    confirmed,
    get_request,
    payconiq_settings,
    payload,
    paynl_settings,
    post_json,
    send_request,
};
use crate::{
    endpoint_tests::mocks::MockStore,
    webhook_routes::{PayconiqCallbackRoute, PaynlExchangeGetRoute, PaynlExchangePostRoute},
};

const ORDER_ID: &str = "EX-4811-1203-4560";
const PCQ_REFERENCE: &str = "3b3f5a0e8a0c4e8f9d2a6c1b7e4f0a92";
const PCQ_PAYMENT_ID: &str = "a4e2c9be1c3f5d0b8a6e7f21";

#[actix_web::test]
async fn paynl_exchange_for_an_unknown_order() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    let g = gateway.clone();
    let (status, body) = get_request(&format!("/webhook/paynl?order_id={ORDER_ID}"), move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().times(1).returning(|_, _| Ok(None));
        store.expect_promote_to_confirmed().never();
        configure(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "TRUE");
    assert_eq!(gateway.verification_count(), 0);
}

#[actix_web::test]
async fn paynl_exchange_without_an_order_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/webhook/paynl?orderStatusId=100", |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().never();
        configure(cfg, store, FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[actix_web::test]
async fn paynl_exchange_confirms_a_paid_order() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    gateway.set_status(ORDER_ID, "100");
    let g = gateway.clone();
    let (status, body) = get_request(&format!("/webhook/paynl?order_id={ORDER_ID}&orderStatusId=100"), move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().returning(|provider, reference| {
            Ok(Some(cache_entry(provider, reference, reference, payload("lichtjes-gent", "Lotte", 10))))
        });
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(paynl_settings())));
        store.expect_promote_to_confirmed().times(1).returning(|provider, reference, evidence| {
            assert!(matches!(&evidence, ProviderEvidence::PayNl { state, .. } if state == "100"));
            Ok(Some(confirmed(provider, reference, payload("lichtjes-gent", "Lotte", 10), evidence)))
        });
        store.expect_remove_cache_entry().never();
        configure(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "TRUE");
    assert_eq!(gateway.verification_count(), 1);
}

#[actix_web::test]
async fn paynl_exchange_post_reads_the_form_body() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    let g = gateway.clone();
    let req = TestRequest::post()
        .uri("/webhook/paynl")
        .set_form([("order_id", ORDER_ID), ("orderStatusId", "20"), ("action", "pending")]);
    let (status, body) = send_request(req, move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().returning(|provider, reference| {
            assert_eq!(reference, ORDER_ID);
            Ok(Some(cache_entry(provider, reference, reference, payload("lichtjes-gent", "Lotte", 10))))
        });
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(paynl_settings())));
        store.expect_promote_to_confirmed().never();
        configure(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "TRUE");
    assert_eq!(gateway.verification_count(), 1);
}

#[actix_web::test]
async fn paynl_exchange_asks_for_a_retry_when_the_store_fails() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&format!("/webhook/paynl?order_id={ORDER_ID}"), |cfg| {
        let mut store = MockStore::new();
        store
            .expect_fetch_cache_entry()
            .returning(|_, _| Err(PaymentCacheError::DatabaseError("database is locked".into())));
        configure(cfg, store, FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[actix_web::test]
async fn payconiq_callback_without_a_reference() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_json("/webhook/payconiq", json!({"paymentId": PCQ_PAYMENT_ID, "status": "SUCCEEDED"}), |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().never();
        configure(cfg, store, FakeGateway::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[actix_web::test]
async fn payconiq_callback_does_not_trust_the_reported_status() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    let g = gateway.clone();
    let callback = json!({"paymentId": PCQ_PAYMENT_ID, "reference": PCQ_REFERENCE, "status": "SUCCEEDED"});
    let (status, body) = post_json("/webhook/payconiq", callback, move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().returning(|provider, reference| {
            assert_eq!(provider, Provider::Payconiq);
            Ok(Some(cache_entry(provider, reference, PCQ_PAYMENT_ID, payload("kaarsjes-brugge", "Els", 5))))
        });
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(payconiq_settings())));
        store.expect_promote_to_confirmed().never();
        configure(cfg, store, g);
    })
    .await;
    // The provider still reports the payment as pending
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(gateway.verification_count(), 1);
}

#[actix_web::test]
async fn payconiq_callback_drops_an_expired_payment() {
    let _ = env_logger::try_init().ok();
    let gateway = FakeGateway::new();
    gateway.set_status(PCQ_PAYMENT_ID, "EXPIRED");
    let g = gateway.clone();
    let callback = json!({"paymentId": PCQ_PAYMENT_ID, "reference": PCQ_REFERENCE, "status": "EXPIRED"});
    let (status, body) = post_json("/webhook/payconiq", callback, move |cfg| {
        let mut store = MockStore::new();
        store.expect_fetch_cache_entry().returning(|provider, reference| {
            Ok(Some(cache_entry(provider, reference, PCQ_PAYMENT_ID, payload("kaarsjes-brugge", "Els", 5))))
        });
        store.expect_fetch_campaign_settings().returning(|_| Ok(Some(payconiq_settings())));
        store.expect_promote_to_confirmed().never();
        store.expect_remove_cache_entry().times(1).returning(|provider, reference| {
            assert_eq!(reference, PCQ_REFERENCE);
            Ok(Some(cache_entry(provider, reference, PCQ_PAYMENT_ID, payload("kaarsjes-brugge", "Els", 5))))
        });
        configure(cfg, store, g);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

fn configure(cfg: &mut ServiceConfig, store: MockStore, gateway: FakeGateway) {
    let api = PaymentFlowApi::new(store, gateway, EventProducers::default());
    cfg.service(PaynlExchangeGetRoute::<MockStore, FakeGateway>::new())
        .service(PaynlExchangePostRoute::<MockStore, FakeGateway>::new())
        .service(PayconiqCallbackRoute::<MockStore, FakeGateway>::new())
        .app_data(web::Data::new(api));
}
