use uuid::Uuid;

use super::models::{BackupTable, WeatherBackup};
use super::BackupDb;

/// Insert a backup row and return it, migrating first if that hasn't succeeded yet.
pub async fn insert_backup(
    db: &BackupDb,
    table: BackupTable,
    location: &str,
    weather_data: &serde_json::Value,
) -> Result<WeatherBackup, sqlx::Error> {
    db.ensure_schema().await?;

    // Table names come from a fixed enum, never from user input
    let sql = format!(
        "INSERT INTO {} (id, timestamp, location, weather_data)
         VALUES ($1, $2, $3, $4)
         RETURNING id, timestamp, location, weather_data, created_at",
        table.name()
    );

    sqlx::query_as::<_, WeatherBackup>(&sql)
        .bind(Uuid::new_v4())
        .bind(chrono::Utc::now().timestamp())
        .bind(location)
        .bind(weather_data)
        .fetch_one(db.pool())
        .await
}
