use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Backup table a row is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupTable {
    /// Client-uploaded results (`POST /upload`).
    WeatherData,
    /// Scheduled backup of the configured location (`GET /tlv`).
    TlvWeather,
}

impl BackupTable {
    pub fn name(self) -> &'static str {
        match self {
            BackupTable::WeatherData => "weather_data",
            BackupTable::TlvWeather => "tlv_weather",
        }
    }
}

/// A stored backup row.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; only some are read back
pub struct WeatherBackup {
    pub id: Uuid,
    /// Unix seconds at upload time
    pub timestamp: i64,
    pub location: String,
    pub weather_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
