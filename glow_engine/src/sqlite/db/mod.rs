//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction (or a savepoint inside one) and call
//! through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod archive;
pub mod cache;
pub mod campaigns;
pub mod confirmed;
pub mod counters;
pub mod shards;

const SQLITE_DB_URL: &str = "sqlite://data/glow_store.db";

pub fn db_url() -> String {
    let result = env::var("GLOW_DATABASE_URL").unwrap_or_else(|_| {
        info!("GLOW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// True if the error is a uniqueness (or primary key) constraint violation.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    match e {
        SqlxError::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
