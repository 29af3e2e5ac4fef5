//! Background workers. Each worker owns its own engine API object and runs on a fixed tokio interval until the server
//! shuts down. Do not await the returned JoinHandles, as they run indefinitely.
use std::time::Duration;

use glow_engine::{events::EventProducers, CacheJanitor, ReconciliationApi, SqliteDatabase};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Starts the reconciliation worker, which drains the confirmed queues into the campaign ledgers.
pub fn start_reconciliation_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // A slow run must not trigger a burst of catch-up runs
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let api = ReconciliationApi::new(db, producers);
        info!("🕰️ Reconciliation worker started. Running every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running reconciliation job");
            match api.run_reconciliation().await {
                Ok(report) => {
                    if report.total_merged() > 0 || report.total_failed() > 0 {
                        info!(
                            "🕰️ Reconciliation run finished. {} donations merged, {} left for the next run",
                            report.total_merged(),
                            report.total_failed()
                        );
                    }
                    for failure in report.providers.iter().flat_map(|p| p.failures.iter()) {
                        warn!("🕰️ [{}] {} could not be merged. {}", failure.provider, failure.reference, failure.reason);
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running reconciliation job: {e}");
                },
            }
        }
    })
}

/// Starts the cache janitor worker, which removes payments that were never confirmed within the retention window.
pub fn start_janitor_worker(db: SqliteDatabase, retention: chrono::Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let janitor = CacheJanitor::new(db, retention);
        info!(
            "🕰️ Cache janitor started. Running every {}s, expiring entries older than {}h",
            interval.as_secs(),
            retention.num_hours()
        );
        loop {
            timer.tick().await;
            trace!("🕰️ Running cache janitor");
            match janitor.expire_stale_entries().await {
                Ok(report) => {
                    if report.count() > 0 {
                        let refs = report.expired.iter().map(|(p, r)| format!("{p}/{r}")).collect::<Vec<_>>().join(", ");
                        info!("🕰️ {} unconfirmed payments expired: {refs}", report.count());
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running cache janitor: {e}");
                },
            }
        }
    })
}
