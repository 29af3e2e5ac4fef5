use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use super::{archive, confirmed, is_unique_violation};
use crate::{
    db_types::{CacheEntry, NewCacheEntry, Provider},
    traits::PaymentCacheError,
};

/// Inserts a new cache entry. Fails with `AlreadyExists` if the reference is present in the cache, the confirmed
/// queue or the archive.
///
/// Run this inside a transaction and roll back on error. The insert comes first so that the transaction holds the
/// write lock before the queue and archive are checked.
pub async fn insert_entry(entry: NewCacheEntry, conn: &mut SqliteConnection) -> Result<CacheEntry, PaymentCacheError> {
    let provider = entry.provider;
    let reference = entry.reference.clone();
    let p = entry.payload;
    let result = sqlx::query_as(
        r#"
            INSERT INTO payment_cache (
                provider,
                reference,
                provider_payment_id,
                campaign_id,
                name,
                description,
                lat,
                lng,
                amount,
                email,
                anonymous,
                language,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(provider)
    .bind(&reference)
    .bind(entry.provider_payment_id)
    .bind(p.campaign_id)
    .bind(p.name)
    .bind(p.description)
    .bind(p.lat)
    .bind(p.lng)
    .bind(p.amount)
    .bind(p.email)
    .bind(p.anonymous)
    .bind(p.language)
    .bind(entry.created_at)
    .fetch_one(&mut *conn)
    .await;
    let entry = match result {
        Ok(entry) => entry,
        Err(e) if is_unique_violation(&e) => return Err(PaymentCacheError::AlreadyExists(provider, reference)),
        Err(e) => return Err(e.into()),
    };
    if confirmed::fetch_by_reference(provider, &reference, conn).await?.is_some()
        || archive::fetch_archived(provider, &reference, conn).await?.is_some()
    {
        debug!("🗃️ [{provider}] {reference} has already been confirmed. Refusing to cache it again");
        return Err(PaymentCacheError::AlreadyExists(provider, reference));
    }
    trace!("🗃️ [{provider}] {reference} added to the payment cache");
    Ok(entry)
}

pub async fn fetch_entry(
    provider: Provider,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CacheEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM payment_cache WHERE provider = $1 AND reference = $2")
        .bind(provider)
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

/// Deletes the cache entry and returns it. `None` means there was nothing to delete.
///
/// Because the row is deleted and returned in one statement, at most one caller can ever receive `Some` for a given
/// entry, no matter how many race for it.
pub async fn delete_entry(
    provider: Provider,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CacheEntry>, sqlx::Error> {
    let entry = sqlx::query_as("DELETE FROM payment_cache WHERE provider = $1 AND reference = $2 RETURNING *")
        .bind(provider)
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

/// Deletes all the provider's cache entries created strictly before `cutoff`.
pub async fn expire_entries(
    provider: Provider,
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<CacheEntry>, sqlx::Error> {
    let expired = sqlx::query_as(
        r#"
            DELETE FROM payment_cache
            WHERE provider = $1 AND julianday(created_at) < julianday($2)
            RETURNING *;
        "#,
    )
    .bind(provider)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(expired)
}
