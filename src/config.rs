/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Directory holding one search-history JSON file per location.
    pub history_dir: String,
    /// Postgres connection string for backup tables. Backups are disabled when unset.
    pub database_url: Option<String>,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub forecast_url: String,
    /// How long a cached forecast response stays valid.
    pub forecast_cache_secs: u64,
    pub forecast_retries: u32,
    /// Seconds; the nth retry waits `factor * 2^n`.
    pub forecast_backoff_factor: f64,
    /// Cap on a single retry delay, in seconds.
    pub forecast_max_backoff_secs: u64,
    pub object_store_url: Option<String>,
    pub sky_object_key: String,
    /// Location fetched and backed up by `GET /tlv`.
    pub backup_location: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            history_dir: std::env::var("HISTORY_DIR")
                .unwrap_or_else(|_| "./search_history".to_string()),
            database_url: non_empty_var("DATABASE_URL"),
            geocoder_url: std::env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "WeatherBoard/0.1".to_string()),
            forecast_url: std::env::var("FORECAST_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            forecast_cache_secs: std::env::var("FORECAST_CACHE_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("FORECAST_CACHE_SECS must be a whole number of seconds"),
            forecast_retries: std::env::var("FORECAST_RETRIES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("FORECAST_RETRIES must be a valid u32"),
            forecast_backoff_factor: std::env::var("FORECAST_BACKOFF_FACTOR")
                .unwrap_or_else(|_| "0.2".to_string())
                .parse()
                .expect("FORECAST_BACKOFF_FACTOR must be a number"),
            forecast_max_backoff_secs: std::env::var("FORECAST_MAX_BACKOFF_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("FORECAST_MAX_BACKOFF_SECS must be a whole number of seconds"),
            object_store_url: non_empty_var("OBJECT_STORE_URL"),
            sky_object_key: std::env::var("SKY_OBJECT_KEY")
                .unwrap_or_else(|_| "sky.jpg".to_string()),
            backup_location: std::env::var("BACKUP_LOCATION")
                .unwrap_or_else(|_| "Tel Aviv".to_string()),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
