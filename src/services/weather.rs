//! Weather report service.
//!
//! Resolves a free-text location, fetches its hourly forecast and aggregates
//! it into daily daytime/nighttime summaries.

use crate::errors::AppError;
use crate::services::aggregate::{aggregate, DailySummary};
use crate::services::geocode::{Geocoder, Location};
use crate::services::open_meteo::OpenMeteoClient;

/// Daily summaries for one resolved location.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub location: Location,
    pub days: Vec<DailySummary>,
}

/// Build a report for a user-supplied location string.
///
/// An unknown location is `AppError::LocationNotFound`; geocoder or forecast
/// failures surface as `AppError::Upstream`.
pub async fn build_report(
    geocoder: &Geocoder,
    forecast: &OpenMeteoClient,
    query: &str,
) -> Result<WeatherReport, AppError> {
    let location = geocoder
        .resolve(query)
        .await?
        .ok_or_else(|| AppError::LocationNotFound(query.to_string()))?;

    let hourly = forecast
        .fetch_hourly(location.latitude, location.longitude)
        .await?;
    let days = aggregate(&hourly.readings);

    tracing::debug!(
        "Aggregated {} hourly readings into {} days for {}",
        hourly.readings.len(),
        days.len(),
        location.name
    );

    Ok(WeatherReport { location, days })
}

/// Flatten a report into `"{date}:{label}:{value}"` lines, four per day.
pub fn backup_lines(report: &WeatherReport) -> Vec<String> {
    report
        .days
        .iter()
        .flat_map(|day| {
            [
                ("Daytime Temperature", day.day_temperature),
                ("Nighttime Temperature", day.night_temperature),
                ("Daytime Humidity", day.day_humidity),
                ("Nighttime Humidity", day.night_humidity),
            ]
            .map(|(label, value)| format!("{}:{}:{}", day.date, label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregate::Measurement;
    use crate::services::open_meteo::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clients(server: &MockServer) -> (Geocoder, OpenMeteoClient) {
        let geocoder = Geocoder::new(&server.uri(), "test-agent").unwrap();
        let forecast = OpenMeteoClient::new(
            &server.uri(),
            Duration::from_secs(60),
            RetryPolicy {
                retries: 0,
                backoff_factor: 0.0,
                ..RetryPolicy::default()
            },
        )
        .unwrap();
        (geocoder, forecast)
    }

    async fn mount_geocoder(server: &MockServer, places: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(places))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_build_report_end_to_end() {
        let server = MockServer::start().await;
        mount_geocoder(
            &server,
            serde_json::json!([{ "lat": "47.37", "lon": "8.54", "display_name": "Zürich, Switzerland" }]),
        )
        .await;
        // 2026-03-01 00:00Z, 12:00Z, 13:00Z at UTC offset 0
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "utc_offset_seconds": 0,
                "hourly": {
                    "time": [1772323200, 1772366400, 1772370000],
                    "temperature_2m": [-1.0, 6.0, 8.0],
                    "relative_humidity_2m": [88.0, 60.0, 50.0],
                    "is_day": [0, 1, 1]
                }
            })))
            .mount(&server)
            .await;

        let (geocoder, forecast) = clients(&server);
        let report = build_report(&geocoder, &forecast, "Zurich").await.unwrap();

        assert_eq!(report.location.name, "Zürich, Switzerland");
        assert_eq!(report.days.len(), 1);
        assert_eq!(report.days[0].day_temperature, Measurement::Value(7.0));
        assert_eq!(report.days[0].night_temperature, Measurement::Value(-1.0));
        assert_eq!(report.days[0].day_humidity, Measurement::Value(55.0));
    }

    #[tokio::test]
    async fn test_build_report_unknown_location() {
        let server = MockServer::start().await;
        mount_geocoder(&server, serde_json::json!([])).await;

        let (geocoder, forecast) = clients(&server);
        let err = build_report(&geocoder, &forecast, "Atlantis").await.unwrap_err();

        assert!(matches!(err, AppError::LocationNotFound(q) if q == "Atlantis"));
    }

    #[tokio::test]
    async fn test_build_report_forecast_failure_is_upstream() {
        let server = MockServer::start().await;
        mount_geocoder(
            &server,
            serde_json::json!([{ "lat": "1.0", "lon": "2.0", "display_name": "Somewhere" }]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (geocoder, forecast) = clients(&server);
        let err = build_report(&geocoder, &forecast, "Somewhere").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_backup_lines() {
        let report = WeatherReport {
            location: Location {
                name: "Tel Aviv-Yafo, Israel".to_string(),
                latitude: 32.08,
                longitude: 34.78,
            },
            days: vec![DailySummary {
                date: "2026-07-01".parse().unwrap(),
                day_temperature: Measurement::Value(29.5),
                night_temperature: Measurement::NotApplicable,
                day_humidity: Measurement::Value(62.25),
                night_humidity: Measurement::NotApplicable,
            }],
        };

        assert_eq!(
            backup_lines(&report),
            vec![
                "2026-07-01:Daytime Temperature:29.5",
                "2026-07-01:Nighttime Temperature:N/A",
                "2026-07-01:Daytime Humidity:62.25",
                "2026-07-01:Nighttime Humidity:N/A",
            ]
        );
    }
}
