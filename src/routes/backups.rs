//! Backup endpoints.
//!
//! - POST /upload: store client-supplied weather data in `weather_data`
//! - GET /tlv: fetch the configured backup location and store it in `tlv_weather`
//!
//! Both answer with a `{"message": ...}` body on success and failure.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::BackupTable;
use crate::db::BackupDb;
use crate::db::queries;
use crate::errors::AppError;
use crate::routes::search::AppState;
use crate::services::weather::{backup_lines, build_report};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub location: Option<String>,
    /// Arbitrary weather payload, stored as-is
    #[serde(rename = "weatherData")]
    #[schema(value_type = Object)]
    pub weather_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Successful backup of the configured location.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationBackupResponse {
    pub message: String,
    /// Resolved display name of the backed-up location
    pub location: String,
    /// `"{date}:{label}:{value}"` lines, four per day
    #[serde(rename = "weatherData")]
    pub weather_data: Vec<String>,
}

fn message(status: StatusCode, message: String) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}

fn backup_db(state: &AppState) -> Result<&BackupDb, AppError> {
    state
        .db
        .as_ref()
        .ok_or_else(|| AppError::Storage("Backup database is not configured".to_string()))
}

/// Empty strings, arrays, objects, `null`, `false` and `0` count as missing.
fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
    }
}

/// Store client-supplied weather data in the backup table.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Backups",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Data stored", body = MessageResponse),
        (status = 400, description = "Missing location or weather data", body = MessageResponse),
        (status = 500, description = "Backup store failure", body = MessageResponse),
    )
)]
pub async fn upload_weather_data(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Response {
    tracing::info!("Weather data upload request received");

    let location = request.location.filter(|l| !l.is_empty());
    let weather_data = request.weather_data.filter(|v| !is_blank(v));
    let (Some(location), Some(weather_data)) = (location, weather_data) else {
        return message(
            StatusCode::BAD_REQUEST,
            "No location or weather data provided".to_string(),
        );
    };

    let result = match backup_db(&state) {
        Ok(db) => queries::insert_backup(db, BackupTable::WeatherData, &location, &weather_data)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(row) => {
            tracing::info!("Weather data for {} stored as {}", location, row.id);
            message(
                StatusCode::OK,
                format!("Successfully uploaded weather data for {}", location),
            )
        }
        Err(e) => {
            tracing::error!("Error uploading weather data for {}: {}", location, e);
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to upload weather data for {}", location),
            )
        }
    }
}

/// Fetch the configured backup location and store its daily summaries.
#[utoipa::path(
    get,
    path = "/tlv",
    tag = "Backups",
    responses(
        (status = 200, description = "Location fetched and stored", body = LocationBackupResponse),
        (status = 500, description = "Fetch or backup failure", body = MessageResponse),
    )
)]
pub async fn backup_location(State(state): State<AppState>) -> Response {
    tracing::info!("Backup request for {} received", state.backup_location);

    match run_location_backup(&state).await {
        Ok((location, weather_data)) => {
            tracing::info!("Backup data for {} stored", location);
            Json(LocationBackupResponse {
                message: format!(
                    "Successfully fetched and uploaded weather data for {}",
                    state.backup_location
                ),
                location,
                weather_data,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("Error during backup of {}: {}", state.backup_location, e);
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Failed to fetch and upload weather data for {}",
                    state.backup_location
                ),
            )
        }
    }
}

async fn run_location_backup(state: &AppState) -> Result<(String, Vec<String>), AppError> {
    let report = build_report(&state.geocoder, &state.forecast, &state.backup_location).await?;
    let lines = backup_lines(&report);
    let db = backup_db(state)?;

    queries::insert_backup(
        db,
        BackupTable::TlvWeather,
        &report.location.name,
        &serde_json::json!(lines),
    )
    .await?;

    Ok((report.location.name, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::search::tests::{mount_weather, test_state};
    use wiremock::MockServer;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&serde_json::json!(null)));
        assert!(is_blank(&serde_json::json!([])));
        assert!(is_blank(&serde_json::json!({})));
        assert!(is_blank(&serde_json::json!("")));
        assert!(is_blank(&serde_json::json!(0)));
        assert!(!is_blank(&serde_json::json!([{"date": "2026-07-01"}])));
        assert!(!is_blank(&serde_json::json!("x")));
    }

    #[tokio::test]
    async fn test_upload_missing_fields_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let response = upload_weather_data(
            State(state),
            Json(UploadRequest {
                location: Some("Tel Aviv".to_string()),
                weather_data: Some(serde_json::json!([])),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "No location or weather data provided"
        );
    }

    #[tokio::test]
    async fn test_upload_empty_location_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let response = upload_weather_data(
            State(state),
            Json(UploadRequest {
                location: Some(String::new()),
                weather_data: Some(serde_json::json!([{"date": "2026-07-01"}])),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_accepts_whitespace_location() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let response = upload_weather_data(
            State(state),
            Json(UploadRequest {
                location: Some("  ".to_string()),
                weather_data: Some(serde_json::json!([{"date": "2026-07-01"}])),
            }),
        )
        .await;

        // Passes validation and reaches the (unconfigured) backup store
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_without_database_is_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let response = upload_weather_data(
            State(state),
            Json(UploadRequest {
                location: Some("Tel Aviv".to_string()),
                weather_data: Some(serde_json::json!([{"date": "2026-07-01"}])),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to upload weather data for Tel Aviv"
        );
    }

    #[tokio::test]
    async fn test_backup_location_without_database_is_server_error() {
        let server = MockServer::start().await;
        mount_weather(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&server.uri(), tmp.path());

        let response = backup_location(State(state)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to fetch and upload weather data for Tel Aviv"
        );
    }
}
