use sqlx::SqliteConnection;

use crate::db_types::{ArchivedPayment, ConfirmedPayment, Provider};

/// Writes the archive copy of a merged payment. Archive rows can never be updated or deleted afterwards; the schema
/// enforces this with triggers.
pub async fn insert_archived(
    payment: &ConfirmedPayment,
    sequence_number: i64,
    conn: &mut SqliteConnection,
) -> Result<ArchivedPayment, sqlx::Error> {
    let p = &payment.payload;
    let archived = sqlx::query_as(
        r#"
            INSERT INTO archived_payments (
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
                sequence_number,
                created_at,
                confirmed_at,
                archived_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *;
        "#,
    )
    .bind(payment.provider)
    .bind(&payment.reference)
    .bind(&payment.provider_payment_id)
    .bind(&p.campaign_id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.lat)
    .bind(p.lng)
    .bind(p.amount)
    .bind(&p.email)
    .bind(p.anonymous)
    .bind(&p.language)
    .bind(&payment.evidence)
    .bind(sequence_number)
    .bind(payment.created_at)
    .bind(payment.confirmed_at)
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(archived)
}

pub async fn fetch_archived(
    provider: Provider,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ArchivedPayment>, sqlx::Error> {
    let archived = sqlx::query_as("SELECT * FROM archived_payments WHERE provider = $1 AND reference = $2")
        .bind(provider)
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(archived)
}
