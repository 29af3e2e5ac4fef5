use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::AggregateCounters;

/// Creates a zeroed counters row for the campaign if none exists.
///
/// Inside a transaction this is also the first write, so SQLite takes the database write lock here, before any
/// counters are read.
pub async fn ensure_counters(campaign_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO campaign_counters (campaign_id, updated_at) VALUES ($1, $2)")
        .bind(campaign_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_counters(
    campaign_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AggregateCounters>, sqlx::Error> {
    let counters = sqlx::query_as("SELECT * FROM campaign_counters WHERE campaign_id = $1")
        .bind(campaign_id)
        .fetch_optional(conn)
        .await?;
    Ok(counters)
}

pub async fn save_counters(counters: &AggregateCounters, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE campaign_counters SET
                total = $2,
                total_amount = $3,
                current_period_count = $4,
                current_period_amount = $5,
                updated_at = $6
            WHERE campaign_id = $1
        "#,
    )
    .bind(&counters.campaign_id)
    .bind(counters.total)
    .bind(counters.total_amount)
    .bind(counters.current_period_count)
    .bind(counters.current_period_amount)
    .bind(counters.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}
