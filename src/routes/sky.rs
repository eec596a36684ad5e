//! GET /sky: download the configured image from object storage.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::search::AppState;

/// Download the sky image as an attachment.
#[utoipa::path(
    get,
    path = "/sky",
    tag = "Storage",
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 500, description = "Object storage unavailable or not configured", body = ErrorResponse),
    )
)]
pub async fn download_sky(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Download image request received");

    let store = state
        .object_store
        .as_ref()
        .ok_or_else(|| AppError::Storage("Object storage is not configured".to_string()))?;
    let bytes = store.get_object(&state.sky_object_key).await?;

    let disposition = format!("attachment;filename={}", state.sky_object_key);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::search::tests::test_state;
    use axum::http::StatusCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_sky() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sky.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&server.uri(), tmp.path());

        let response = download_sky(State(state)).await.unwrap().into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment;filename=sky.jpg"
        );
    }

    #[tokio::test]
    async fn test_download_sky_not_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = test_state("http://127.0.0.1:9", tmp.path());
        state.object_store = None;

        match download_sky(State(state)).await {
            Ok(_) => panic!("expected a storage error"),
            Err(e) => assert_eq!(e.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
