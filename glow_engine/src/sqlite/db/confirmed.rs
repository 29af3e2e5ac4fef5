use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{CacheEntry, ConfirmedPayment, Provider, ProviderEvidence};

/// Adds the cache entry to the confirmed queue. The caller is responsible for removing it from the cache in the same
/// transaction.
pub async fn insert_confirmed(
    entry: CacheEntry,
    evidence: ProviderEvidence,
    conn: &mut SqliteConnection,
) -> Result<ConfirmedPayment, sqlx::Error> {
    let p = entry.payload;
    let payment: ConfirmedPayment = sqlx::query_as(
        r#"
            INSERT INTO confirmed_payments (
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
                evidence,
                created_at,
                confirmed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(entry.provider)
    .bind(entry.reference)
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
    .bind(Json(evidence))
    .bind(entry.created_at)
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ [{}] {} queued for reconciliation as #{}", payment.provider, payment.reference, payment.id);
    Ok(payment)
}

/// The provider's confirmed queue, in the order the payments were confirmed.
pub async fn fetch_queue(provider: Provider, conn: &mut SqliteConnection) -> Result<Vec<ConfirmedPayment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM confirmed_payments WHERE provider = $1 ORDER BY id ASC")
        .bind(provider)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn fetch_by_reference(
    provider: Provider,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ConfirmedPayment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM confirmed_payments WHERE provider = $1 AND reference = $2")
        .bind(provider)
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Removes the payment from the queue. Returns false if it was not there.
pub async fn delete_confirmed(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM confirmed_payments WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
