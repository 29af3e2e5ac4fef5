use chrono::Utc;
use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{DonationRecord, Shard};

/// All shards of the campaign, ordered by shard index.
pub async fn fetch_shards(campaign_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Shard>, sqlx::Error> {
    let shards = sqlx::query_as(
        "SELECT campaign_id, shard_index, candles FROM ledger_shards WHERE campaign_id = $1 ORDER BY shard_index",
    )
    .bind(campaign_id)
    .fetch_all(conn)
    .await?;
    Ok(shards)
}

pub async fn fetch_shard(
    campaign_id: &str,
    shard_index: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Shard>, sqlx::Error> {
    let shard = sqlx::query_as(
        "SELECT campaign_id, shard_index, candles FROM ledger_shards WHERE campaign_id = $1 AND shard_index = $2",
    )
    .bind(campaign_id)
    .bind(shard_index)
    .fetch_optional(conn)
    .await?;
    Ok(shard)
}

/// Creates the shard with the given records, or replaces the records of an existing shard.
pub async fn save_shard(
    campaign_id: &str,
    shard_index: i64,
    candles: &[DonationRecord],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO ledger_shards (campaign_id, shard_index, candles, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(campaign_id, shard_index) DO UPDATE SET
                candles = excluded.candles,
                updated_at = excluded.updated_at
        "#,
    )
    .bind(campaign_id)
    .bind(shard_index)
    .bind(Json(candles))
    .bind(Utc::now())
    .execute(conn)
    .await?;
    trace!("🗃️ Shard {campaign_id}/{shard_index} saved with {} records", candles.len());
    Ok(())
}

/// Deletes every shard of the campaign with an index of `from_index` or higher.
pub async fn delete_shards_from(
    campaign_id: &str,
    from_index: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ledger_shards WHERE campaign_id = $1 AND shard_index >= $2")
        .bind(campaign_id)
        .bind(from_index)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
