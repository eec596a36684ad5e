// Weather Board API v0.1
use axum::http::Method;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use db::BackupDb;
use routes::search::AppState;
use services::geocode::Geocoder;
use services::history::HistoryStore;
use services::object_store::ObjectStoreClient;
use services::open_meteo::{OpenMeteoClient, RetryPolicy};

/// Maximum number of connections in the backup database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;

/// Weather Board API: OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Board API",
        version = "0.1.0",
        description = "Resolves a place name, fetches its hourly forecast from Open-Meteo \
            and summarizes it into daytime/nighttime averages per day. Searches are \
            recorded per location; results can be backed up to Postgres.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Search", description = "Location weather search"),
        (name = "History", description = "Recorded searches"),
        (name = "Backups", description = "Result backups"),
        (name = "Storage", description = "Object storage downloads"),
    ),
    paths(
        routes::health::health_check,
        routes::search::home,
        routes::search::search_form,
        routes::search::search_json,
        routes::history::list_history,
        routes::history::download_history,
        routes::backups::upload_weather_data,
        routes::backups::backup_location,
        routes::sky::download_sky,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::search::SearchForm,
            routes::search::SearchRequest,
            routes::search::SearchResponse,
            routes::search::LocationResponse,
            routes::search::DayResponse,
            services::history::HistoryListing,
            routes::backups::UploadRequest,
            routes::backups::MessageResponse,
            routes::backups::LocationBackupResponse,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weather_board_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Backup database is optional; connect lazily so startup doesn't need it
    let db = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(DB_POOL_MAX_CONNECTIONS)
                .connect_lazy(url)
                .expect("DATABASE_URL is not a valid Postgres connection string");
            let db = BackupDb::new(pool);
            if let Err(e) = db.ensure_schema().await {
                tracing::error!("Failed to run database migrations, retrying on first backup: {}", e);
            }
            Some(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; backup endpoints are disabled");
            None
        }
    };

    let object_store = config.object_store_url.as_deref().map(|url| {
        ObjectStoreClient::new(url).expect("Failed to build object storage client")
    });
    if object_store.is_none() {
        tracing::warn!("OBJECT_STORE_URL not set; /sky is disabled");
    }

    let app_state = AppState {
        geocoder: Geocoder::new(&config.geocoder_url, &config.geocoder_user_agent)
            .expect("Failed to build geocoder client"),
        forecast: OpenMeteoClient::new(
            &config.forecast_url,
            Duration::from_secs(config.forecast_cache_secs),
            RetryPolicy {
                retries: config.forecast_retries,
                backoff_factor: config.forecast_backoff_factor,
                max_delay: Duration::from_secs(config.forecast_max_backoff_secs),
            },
        )
        .expect("Failed to build forecast client"),
        history: HistoryStore::new(&config.history_dir),
        db,
        object_store,
        sky_object_key: config.sky_object_key.clone(),
        backup_location: config.backup_location.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route(
            "/",
            get(routes::search::home).post(routes::search::search_form),
        )
        .route("/api/v1/search", post(routes::search::search_json))
        .route("/history", get(routes::history::list_history))
        .route(
            "/download/:filename",
            get(routes::history::download_history),
        )
        .route("/upload", post(routes::backups::upload_weather_data))
        .route("/tlv", get(routes::backups::backup_location))
        .route("/sky", get(routes::sky::download_sky))
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
