use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use glow_engine::{
    events::EventProducers,
    CacheJanitor,
    LedgerApi,
    PaymentFlowApi,
    ReconciliationApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{AdminToken, ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{hooks::create_event_handlers, providers::ProviderClients},
    routes::{
        health,
        AddDonationRoute,
        CountersRoute,
        DeleteDonationRoute,
        DonateRoute,
        DonationsRoute,
        EditDonationRoute,
        ExpireCacheNowRoute,
        LatestDonationRoute,
        PaymentStatusRoute,
        ReconcileNowRoute,
        RecomputeCountersRoute,
        RegisterCampaignRoute,
    },
    webhook_routes::{PayconiqCallbackRoute, PaynlExchangeGetRoute, PaynlExchangePostRoute},
    workers::{start_janitor_worker, start_reconciliation_worker},
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = ProviderClients::new(config.providers.clone(), config.provider_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _reconciler = start_reconciliation_worker(db.clone(), producers.clone(), config.reconcile_interval);
    let _janitor = start_janitor_worker(db.clone(), config.cache_retention, config.janitor_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: ProviderClients,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let admin_token = AdminToken(config.admin_token.clone());
    let verification_timeout = config.provider_timeout;
    let cache_retention = config.cache_retention;
    let srv = HttpServer::new(move || {
        let flow_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_verification_timeout(verification_timeout);
        let ledger_api = LedgerApi::new(db.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), producers.clone());
        let janitor = CacheJanitor::new(db.clone(), cache_retention);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("glow::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(janitor))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(admin_token.clone()))
            .service(health)
            .service(DonateRoute::<SqliteDatabase, ProviderClients>::new())
            .service(LatestDonationRoute::<SqliteDatabase>::new())
            .service(DonationsRoute::<SqliteDatabase>::new())
            .service(CountersRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, ProviderClients>::new())
            .service(PaynlExchangeGetRoute::<SqliteDatabase, ProviderClients>::new())
            .service(PaynlExchangePostRoute::<SqliteDatabase, ProviderClients>::new())
            .service(PayconiqCallbackRoute::<SqliteDatabase, ProviderClients>::new())
            .service(RegisterCampaignRoute::<SqliteDatabase, ProviderClients>::new())
            .service(AddDonationRoute::<SqliteDatabase>::new())
            .service(EditDonationRoute::<SqliteDatabase>::new())
            .service(DeleteDonationRoute::<SqliteDatabase>::new())
            .service(RecomputeCountersRoute::<SqliteDatabase>::new())
            .service(ReconcileNowRoute::<SqliteDatabase>::new())
            .service(ExpireCacheNowRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Routes registered. Listening on {}:{}", config.host, config.port);
    Ok(srv)
}
