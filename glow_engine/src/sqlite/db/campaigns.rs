use sqlx::SqliteConnection;

use crate::db_types::CampaignSettings;

pub async fn fetch_settings(
    campaign_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CampaignSettings>, sqlx::Error> {
    let settings = sqlx::query_as("SELECT * FROM campaign_settings WHERE campaign_id = $1")
        .bind(campaign_id)
        .fetch_optional(conn)
        .await?;
    Ok(settings)
}

pub async fn upsert_settings(settings: CampaignSettings, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO campaign_settings (
                campaign_id,
                payment_method,
                paynl_service_id,
                payconiq_api_key,
                allow_anonymous,
                custom_url
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(campaign_id) DO UPDATE SET
                payment_method = excluded.payment_method,
                paynl_service_id = excluded.paynl_service_id,
                payconiq_api_key = excluded.payconiq_api_key,
                allow_anonymous = excluded.allow_anonymous,
                custom_url = excluded.custom_url
        "#,
    )
    .bind(settings.campaign_id)
    .bind(settings.payment_method)
    .bind(settings.paynl_service_id)
    .bind(settings.payconiq_api_key.map(|k| k.reveal().clone()))
    .bind(settings.allow_anonymous)
    .bind(settings.custom_url)
    .execute(conn)
    .await?;
    Ok(())
}
