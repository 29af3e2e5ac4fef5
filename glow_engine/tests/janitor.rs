use chrono::Duration;
use glow_engine::{
    db_types::{PaymentState, Provider},
    donation_objects::NotificationOutcome,
    events::EventProducers,
    test_utils::{
        fake_gateway::FakeGateway,
        prepare_env::{new_test_database, tear_down},
    },
    CacheJanitor,
    LedgerManagement,
    PaymentCacheManagement,
    PaymentFlowApi,
};
use support::*;

mod support;

#[tokio::test]
async fn stale_entries_expire_and_late_confirmations_are_ignored() {
    let db = new_test_database().await;
    register_campaigns(&db).await;
    cache_donation_at(&db, Provider::PayNl, "EX-OLD", payload(PAYNL_CAMPAIGN, "Old", 10), hours_ago(25)).await;
    cache_donation_at(&db, Provider::PayNl, "EX-NEW", payload(PAYNL_CAMPAIGN, "New", 10), hours_ago(1)).await;
    cache_donation_at(&db, Provider::Payconiq, "cc-old", payload(PAYCONIQ_CAMPAIGN, "Old", 10), hours_ago(48)).await;

    let janitor = CacheJanitor::new(db.clone(), Duration::hours(24));
    let report = janitor.expire_stale_entries().await.unwrap();
    assert_eq!(report.count(), 2);
    assert!(report.expired.contains(&(Provider::PayNl, "EX-OLD".to_string())));
    assert!(report.expired.contains(&(Provider::Payconiq, "cc-old".to_string())));
    assert!(db.fetch_cache_entry(Provider::PayNl, "EX-OLD").await.unwrap().is_none());
    assert!(db.fetch_cache_entry(Provider::PayNl, "EX-NEW").await.unwrap().is_some());

    // The provider finally reports the expired payment as paid. Nothing happens.
    let gateway = FakeGateway::new();
    gateway.set_status("EX-OLD", "100");
    let api = PaymentFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
    let outcome = api.handle_notification(Provider::PayNl, "EX-OLD").await.unwrap();
    assert_eq!(outcome, NotificationOutcome::AlreadyProcessed);
    assert_eq!(gateway.verification_count(), 0);
    assert!(db.fetch_confirmed_payments(Provider::PayNl).await.unwrap().is_empty());
    assert_eq!(api.payment_state(Provider::PayNl, "EX-OLD").await.unwrap(), PaymentState::Unknown);

    // Running again finds nothing new
    assert_eq!(janitor.expire_stale_entries().await.unwrap().count(), 0);
    tear_down(db).await;
}

#[tokio::test]
async fn confirmed_payments_are_never_expired() {
    let db = new_test_database().await;
    register_campaigns(&db).await;
    confirm_donation(&db, Provider::PayNl, "EX-0001", payload(PAYNL_CAMPAIGN, "Kept", 10)).await;
    let janitor = CacheJanitor::new(db.clone(), Duration::hours(24));
    // A cutoff in the future would expire anything still in the cache
    let report = janitor.expire_entries_before(chrono::Utc::now() + Duration::hours(1)).await.unwrap();
    assert_eq!(report.count(), 0);
    assert_eq!(db.fetch_confirmed_payments(Provider::PayNl).await.unwrap().len(), 1);
    assert_eq!(db.fetch_payment_state(Provider::PayNl, "EX-0001").await.unwrap(), PaymentState::Confirmed);
    tear_down(db).await;
}
