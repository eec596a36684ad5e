use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::search::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when the backup DB is unreachable)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the backup database is reachable; null when none is configured
    pub database: Option<bool>,
}

/// Health check endpoint.
///
/// Returns the API status and version. When a backup database is configured
/// its connectivity is checked with a simple query; an unreachable DB yields
/// status "degraded" (still 200).
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.db {
        Some(db) => Some(
            sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(db.pool())
                .await
                .is_ok(),
        ),
        None => None,
    };

    Json(HealthResponse {
        status: if database == Some(false) {
            "degraded".to_string()
        } else {
            "ok".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::search::tests::test_state;

    #[tokio::test]
    async fn test_health_without_database() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9", tmp.path());

        let Json(health) = health_check(State(state)).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.database, None);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
