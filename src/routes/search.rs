//! Location search endpoints.
//!
//! - GET /: search form
//! - POST /: form submission (`content=<location>`)
//! - POST /api/v1/search: JSON submission (`{"location": "..."}`)

use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::BackupDb;
use crate::errors::{AppError, ErrorResponse};
use crate::services::aggregate::{DailySummary, Measurement};
use crate::services::geocode::{Geocoder, Location};
use crate::services::history::HistoryStore;
use crate::services::object_store::ObjectStoreClient;
use crate::services::open_meteo::OpenMeteoClient;
use crate::services::weather::{build_report, WeatherReport};

const HOME_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Weather Board</title></head>
<body>
  <h1>Weather Board</h1>
  <form method="post" action="/">
    <input type="text" name="content" placeholder="City or place" autofocus>
    <button type="submit">Search</button>
  </form>
  <p><a href="/history">Search history</a></p>
</body>
</html>
"#;

/// Shared application state.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) geocoder: Geocoder,
    pub(crate) forecast: OpenMeteoClient,
    pub(crate) history: HistoryStore,
    /// Backup database; `None` disables `/upload` and `/tlv`.
    pub(crate) db: Option<BackupDb>,
    /// `None` disables `/sky`.
    pub(crate) object_store: Option<ObjectStoreClient>,
    pub(crate) sky_object_key: String,
    pub(crate) backup_location: String,
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Form body posted by the search page.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchForm {
    /// Free-text location
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free-text location, e.g. "Tel Aviv"
    pub location: String,
}

/// The place a search resolved to.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    /// Display name from the geocoder
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for LocationResponse {
    fn from(l: &Location) -> Self {
        Self {
            name: l.name.clone(),
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }
}

/// Daytime/nighttime averages for one date.
///
/// Each value is a number, or the string "N/A" when the date had no
/// readings in that category.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayResponse {
    pub date: NaiveDate,
    /// Mean daytime temperature in Celsius, or "N/A"
    #[schema(value_type = Object)]
    pub day_temperature: Measurement,
    /// Mean nighttime temperature in Celsius, or "N/A"
    #[schema(value_type = Object)]
    pub night_temperature: Measurement,
    /// Mean daytime relative humidity in percent, or "N/A"
    #[schema(value_type = Object)]
    pub day_humidity: Measurement,
    /// Mean nighttime relative humidity in percent, or "N/A"
    #[schema(value_type = Object)]
    pub night_humidity: Measurement,
}

impl From<&DailySummary> for DayResponse {
    fn from(d: &DailySummary) -> Self {
        Self {
            date: d.date,
            day_temperature: d.day_temperature,
            night_temperature: d.night_temperature,
            day_humidity: d.day_humidity,
            night_humidity: d.night_humidity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub location: LocationResponse,
    /// One entry per forecast date, ascending
    pub days: Vec<DayResponse>,
    /// Whether the search was recorded in the history directory
    pub history_saved: bool,
}

impl SearchResponse {
    fn new(report: &WeatherReport, history_saved: bool) -> Self {
        Self {
            location: LocationResponse::from(&report.location),
            days: report.days.iter().map(DayResponse::from).collect(),
            history_saved,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Search form page.
#[utoipa::path(
    get,
    path = "/",
    tag = "Search",
    responses((status = 200, description = "HTML search form", body = String, content_type = "text/html"))
)]
pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// Search via the HTML form.
#[utoipa::path(
    post,
    path = "/",
    tag = "Search",
    request_body(content = SearchForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Daily summaries for the location", body = SearchResponse),
        (status = 400, description = "Empty or unknown location", body = ErrorResponse),
        (status = 500, description = "Forecast provider failure", body = ErrorResponse),
    )
)]
pub async fn search_form(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResponse>, AppError> {
    run_search(&state, &form.content).await.map(Json)
}

/// Search via JSON.
#[utoipa::path(
    post,
    path = "/api/v1/search",
    tag = "Search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Daily summaries for the location", body = SearchResponse),
        (status = 400, description = "Empty or unknown location", body = ErrorResponse),
        (status = 500, description = "Forecast provider failure", body = ErrorResponse),
    )
)]
pub async fn search_json(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    run_search(&state, &request.location).await.map(Json)
}

async fn run_search(state: &AppState, location: &str) -> Result<SearchResponse, AppError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::BadRequest("Location must not be empty".to_string()));
    }

    let report = build_report(&state.geocoder, &state.forecast, location).await?;

    // A failed history write doesn't fail the search
    let history_saved = match state.history.append(location, &report).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Failed to save search history for '{}': {}", location, e);
            false
        }
    };

    Ok(SearchResponse::new(&report, history_saved))
}
