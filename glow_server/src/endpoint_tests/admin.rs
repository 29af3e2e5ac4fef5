use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use glow_common::{Amount, Secret};
use glow_engine::{db_types::AggregateCounters, LedgerApi, LedgerError};
use serde_json::{json, Value};

use super::helpers::{record, send_request, ADMIN_TOKEN};
use crate::{
    config::AdminToken,
    endpoint_tests::mocks::MockStore,
    middleware::ADMIN_TOKEN_HEADER,
    routes::{AddDonationRoute, DeleteDonationRoute, EditDonationRoute, RecomputeCountersRoute},
};

const DONATION_PATH: &str = "/admin/campaigns/lichtjes-gent/donations/2";

#[actix_web::test]
async fn admin_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::delete().uri(DONATION_PATH), |cfg| {
        configure(cfg, ADMIN_TOKEN, untouched_store())
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Insufficient permissions");
}

#[actix_web::test]
async fn admin_routes_refuse_a_wrong_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, "kaars-admin-0002"));
    let (status, _) = send_request(req, |cfg| configure(cfg, ADMIN_TOKEN, untouched_store())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_routes_refuse_a_prefix_of_the_token() {
    let _ = env_logger::try_init().ok();
    for token in ["kaars-admin-000", "kaars-admin-00011", "k"] {
        let req = TestRequest::delete().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, token));
        let (status, _) = send_request(req, |cfg| configure(cfg, ADMIN_TOKEN, untouched_store())).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{token} was accepted");
    }
}

#[actix_web::test]
async fn admin_routes_are_closed_without_a_configured_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, ""));
    let (status, _) = send_request(req, |cfg| configure(cfg, "", untouched_store())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn delete_a_donation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN));
    let (status, body) = send_request(req, |cfg| {
        let mut store = MockStore::new();
        store.expect_delete_donation().times(1).returning(|campaign_id, number| {
            assert_eq!(campaign_id, "lichtjes-gent");
            Ok(record(number, "Bram", 5, 4))
        });
        configure(cfg, ADMIN_TOKEN, store)
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let deleted: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(deleted["number"], 2);
    assert_eq!(deleted["name"], "Bram");
}

#[actix_web::test]
async fn delete_a_missing_donation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN));
    let (status, _) = send_request(req, |cfg| {
        let mut store = MockStore::new();
        store.expect_delete_donation().returning(|campaign_id, number| {
            Err(LedgerError::DonationNotFound { campaign_id: campaign_id.to_string(), number })
        });
        configure(cfg, ADMIN_TOKEN, store)
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn edit_a_donation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::patch()
        .uri(DONATION_PATH)
        .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))
        .set_json(json!({"name": "  Bram & Lien  "}));
    let (status, body) = send_request(req, |cfg| {
        let mut store = MockStore::new();
        store.expect_update_donation().times(1).returning(|_, number, update| {
            assert_eq!(update.name.as_deref(), Some("Bram & Lien"));
            let mut edited = record(number, "Bram", 5, 4);
            edited.apply_update(update);
            Ok(edited)
        });
        configure(cfg, ADMIN_TOKEN, store)
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let edited: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(edited["name"], "Bram & Lien");
}

#[actix_web::test]
async fn an_empty_edit_is_refused() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::patch().uri(DONATION_PATH).insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN)).set_json(json!({}));
    let (status, body) = send_request(req, |cfg| configure(cfg, ADMIN_TOKEN, untouched_store())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: The update does not change anything"}"#);
}

#[actix_web::test]
async fn add_a_donation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/admin/campaigns/lichtjes-gent/donations")
        .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))
        .set_json(json!({
            "name": "Lien",
            "lat": 51.05,
            "lng": 3.72,
            "amount": 2500,
            "provider": "paynl",
            "reference": "cash-0001"
        }));
    let (status, body) = send_request(req, |cfg| {
        let mut store = MockStore::new();
        store.expect_add_donation().times(1).returning(|campaign_id, donation| {
            assert_eq!(campaign_id, "lichtjes-gent");
            assert_eq!(donation.amount, Amount::from_euros(25));
            Ok(donation.into_record(8))
        });
        configure(cfg, ADMIN_TOKEN, store)
    })
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let added: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(added["number"], 8);
    assert_eq!(added["name"], "Lien");
    assert_eq!(added["reference"], "cash-0001");
}

#[actix_web::test]
async fn an_oversized_donation_is_refused() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/admin/campaigns/lichtjes-gent/donations")
        .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))
        .set_json(json!({
            "name": "Lien",
            "lat": 51.05,
            "lng": 3.72,
            "amount": 9_000_000_000_000_000_i64,
            "provider": "paynl",
            "reference": "cash-0002"
        }));
    let (status, _) = send_request(req, |cfg| configure(cfg, ADMIN_TOKEN, untouched_store())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn recompute_counters() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/admin/campaigns/lichtjes-gent/recompute")
        .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN));
    let (status, body) = send_request(req, |cfg| {
        let mut store = MockStore::new();
        store.expect_recompute_counters().times(1).returning(|campaign_id| {
            Ok(AggregateCounters {
                campaign_id: campaign_id.to_string(),
                total: 3,
                total_amount: Amount::from_euros(35),
                current_period_count: 1,
                current_period_amount: Amount::from_euros(20),
                updated_at: Utc::now(),
            })
        });
        configure(cfg, ADMIN_TOKEN, store)
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let counters: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(counters["total"], 3);
    assert_eq!(counters["total_amount"], 3500);
}

fn untouched_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_add_donation().never();
    store.expect_delete_donation().never();
    store.expect_update_donation().never();
    store
}

fn configure(cfg: &mut ServiceConfig, token: &str, store: MockStore) {
    cfg.service(AddDonationRoute::<MockStore>::new())
        .service(EditDonationRoute::<MockStore>::new())
        .service(DeleteDonationRoute::<MockStore>::new())
        .service(RecomputeCountersRoute::<MockStore>::new())
        .app_data(web::Data::new(LedgerApi::new(store)))
        .app_data(web::Data::new(AdminToken(Secret::new(token.to_string()))));
}
