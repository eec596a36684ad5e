//! Open-Meteo hourly forecast client.
//!
//! Fetches temperature, relative humidity and the day/night flag for a
//! coordinate pair and localizes the timestamps with the provider-supplied
//! UTC offset. See: https://open-meteo.com/en/docs
//!
//! Responses are cached in memory keyed by request URL for a fixed period,
//! and transient failures (connect errors, timeouts, 5xx, 429) are retried
//! with exponential backoff.

use chrono::DateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::services::aggregate::HourlyReading;

const FORECAST_PATH: &str = "/v1/forecast";
const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,is_day";
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Retry behaviour for forecast requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Base delay in seconds; retry n (0-based) waits `factor * 2^n`.
    pub backoff_factor: f64,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^1024 is already infinite as f64
        let exponent = attempt.min(1024) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff_factor: 0.2,
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Localized hourly series for one location.
#[derive(Debug, Clone)]
pub struct HourlyForecast {
    pub utc_offset_seconds: i64,
    pub readings: Vec<HourlyReading>,
}

#[derive(Debug, Clone)]
struct CachedForecast {
    fetched_at: Instant,
    forecast: HourlyForecast,
}

/// Client for the Open-Meteo forecast API.
///
/// Clones share the response cache.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    cache_expiry: Duration,
    retry: RetryPolicy,
    cache: Arc<RwLock<HashMap<String, CachedForecast>>>,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<i64>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    is_day: Vec<Option<f64>>,
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Done(serde_json::Value),
    Retryable(String),
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, cache_expiry: Duration, retry: RetryPolicy) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_expiry,
            retry,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn request_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}{}?latitude={}&longitude={}&hourly={}&timezone=auto&timeformat=unixtime",
            self.base_url, FORECAST_PATH, lat, lon, HOURLY_VARIABLES
        )
    }

    /// Fetch the hourly series for a coordinate pair.
    pub async fn fetch_hourly(&self, lat: f64, lon: f64) -> Result<HourlyForecast, AppError> {
        let url = self.request_url(lat, lon);

        if let Some(hit) = self.cached(&url).await {
            tracing::debug!("Forecast cache hit for ({}, {})", lat, lon);
            return Ok(hit);
        }

        let body = self.get_with_retry(&url).await?;
        let response: ForecastResponse = serde_json::from_value(body).map_err(|e| {
            AppError::Upstream(format!("Open-Meteo response structure error: {}", e))
        })?;
        let forecast = parse_hourly(response)?;

        tracing::info!(
            "Fetched {} hourly readings for ({}, {}), UTC offset {}s",
            forecast.readings.len(),
            lat,
            lon,
            forecast.utc_offset_seconds
        );

        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.cache_expiry);
        cache.insert(
            url,
            CachedForecast {
                fetched_at: Instant::now(),
                forecast: forecast.clone(),
            },
        );
        Ok(forecast)
    }

    async fn cached(&self, url: &str) -> Option<HourlyForecast> {
        let cache = self.cache.read().await;
        cache
            .get(url)
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_expiry)
            .map(|entry| entry.forecast.clone())
    }

    async fn get_with_retry(&self, url: &str) -> Result<serde_json::Value, AppError> {
        let mut attempt = 0;
        loop {
            match self.try_get(url).await? {
                Attempt::Done(body) => return Ok(body),
                Attempt::Retryable(reason) if attempt < self.retry.retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Open-Meteo attempt {} failed ({}), retrying in {:.1}s",
                        attempt + 1,
                        reason,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Retryable(reason) => {
                    return Err(AppError::Upstream(format!(
                        "Open-Meteo request failed after {} attempts: {}",
                        attempt + 1,
                        reason
                    )));
                }
            }
        }
    }

    async fn try_get(&self, url: &str) -> Result<Attempt, AppError> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Ok(Attempt::Retryable(e.to_string()))
            }
            Err(e) => {
                return Err(AppError::Upstream(format!("Open-Meteo request failed: {}", e)))
            }
        };

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::Retryable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Open-Meteo returned HTTP {}", status)));
        }

        let body = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Open-Meteo JSON parse error: {}", e)))?;
        Ok(Attempt::Done(body))
    }
}

/// Turn the columnar hourly block into localized readings.
///
/// Rows with a missing value are skipped; a series with no usable rows is an error.
fn parse_hourly(response: ForecastResponse) -> Result<HourlyForecast, AppError> {
    let hourly = response.hourly;
    let n = hourly.time.len();
    if hourly.temperature_2m.len() != n
        || hourly.relative_humidity_2m.len() != n
        || hourly.is_day.len() != n
    {
        return Err(AppError::Upstream(format!(
            "Open-Meteo hourly arrays have mismatched lengths (time={}, temperature={}, humidity={}, is_day={})",
            n,
            hourly.temperature_2m.len(),
            hourly.relative_humidity_2m.len(),
            hourly.is_day.len()
        )));
    }

    let offset = response.utc_offset_seconds;
    let mut readings = Vec::with_capacity(n);
    let mut skipped = 0;

    for i in 0..n {
        let (Some(temperature), Some(relative_humidity), Some(is_day)) = (
            hourly.temperature_2m[i],
            hourly.relative_humidity_2m[i],
            hourly.is_day[i],
        ) else {
            skipped += 1;
            continue;
        };

        let local = DateTime::from_timestamp(hourly.time[i] + offset, 0)
            .ok_or_else(|| {
                AppError::Upstream(format!("Open-Meteo returned invalid time {}", hourly.time[i]))
            })?
            .naive_utc();

        readings.push(HourlyReading {
            date: local.date(),
            time: local.time(),
            temperature,
            relative_humidity,
            is_day: is_day != 0.0,
        });
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} incomplete hourly rows from Open-Meteo", skipped);
    }
    if readings.is_empty() {
        return Err(AppError::Upstream(
            "Open-Meteo returned no usable hourly data".to_string(),
        ));
    }

    Ok(HourlyForecast {
        utc_offset_seconds: offset,
        readings,
    })
}
