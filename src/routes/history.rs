//! Search history endpoints.
//!
//! - GET /history: list recorded locations
//! - GET /download/:filename: download one location's history file

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::search::AppState;
use crate::services::history::HistoryListing;

/// List all locations with recorded searches, sorted by location.
#[utoipa::path(
    get,
    path = "/history",
    tag = "History",
    responses(
        (status = 200, description = "Recorded locations", body = Vec<HistoryListing>),
        (status = 500, description = "History directory unreadable", body = ErrorResponse),
    )
)]
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryListing>>, AppError> {
    Ok(Json(state.history.list().await?))
}

/// Download a history file as an attachment.
#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "History",
    params(
        ("filename" = String, Path, description = "History file name, e.g. Tel_Aviv.json"),
    ),
    responses(
        (status = 200, description = "History file contents (JSON attachment)"),
        (status = 400, description = "Invalid file name", body = ErrorResponse),
        (status = 404, description = "No history for this file name", body = ErrorResponse),
    )
)]
pub async fn download_history(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.history.read_file(&filename).await?;
    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::search::tests::test_state;
    use crate::services::geocode::Location;
    use crate::services::weather::WeatherReport;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_list_history_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", &tmp.path().join("missing"));

        let Json(listings) = list_history(State(state)).await.unwrap();

        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn test_download_history_sets_attachment_header() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("Oslo.json"),
            r#"{"location":"Oslo","searches":[]}"#,
        )
        .unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let response = download_history(State(state), Path("Oslo.json".to_string()))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Oslo.json\""
        );
    }

    #[tokio::test]
    async fn test_download_history_of_quoted_location() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());
        let report = WeatherReport {
            location: Location {
                name: "Ab".to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            days: Vec::new(),
        };
        state.history.append("a\"b", &report).await.unwrap();

        let Json(listings) = list_history(State(state.clone())).await.unwrap();
        assert_eq!(listings[0].file, "ab.json");

        let response = download_history(State(state), Path(listings[0].file.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ab.json\""
        );
    }

    #[tokio::test]
    async fn test_download_history_rejects_quoted_name() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        match download_history(State(state), Path("a\"b.json".to_string())).await {
            Ok(_) => panic!("quoted name should be rejected"),
            Err(e) => assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST),
        }
    }

    #[tokio::test]
    async fn test_download_history_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let result = download_history(State(state), Path("../config.json".to_string())).await;

        match result {
            Ok(_) => panic!("traversal path should be rejected"),
            Err(e) => assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST),
        }
    }
}
