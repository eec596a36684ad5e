//! File-backed search history.
//!
//! Each searched location gets one pretty-printed JSON file in the history
//! directory holding every search made for it:
//!
//! ```json
//! { "location": "Tel Aviv", "searches": [ { "timestamp": "...", "weather_data": [...] } ] }
//! ```
//!
//! Appends are read-modify-write, so they are serialized through a single
//! async mutex shared by all clones of the store. The new contents go to a
//! sibling `.tmp` file that is then renamed over the old one, so readers
//! only ever see a complete file.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::{
    history_file_name, is_safe_history_file_name, location_from_file_name, HISTORY_EXTENSION,
};
use crate::services::aggregate::Measurement;
use crate::services::weather::WeatherReport;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TEMP_SUFFIX: &str = ".tmp";

/// All searches recorded for one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    pub location: String,
    pub searches: Vec<SearchEntry>,
}

/// One search: when it happened and the days it returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEntry {
    pub timestamp: String,
    pub weather_data: Vec<DayRecord>,
}

/// A daily summary as persisted, tagged with the resolved location name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub day_temperature: Measurement,
    pub night_temperature: Measurement,
    pub day_humidity: Measurement,
    pub night_humidity: Measurement,
    pub location: String,
}

/// A history file available for download.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryListing {
    /// Location label derived from the file name
    pub location: String,
    /// File name to pass to `/download/{filename}`
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[cfg(test)]
    fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append a search for `location` (the text the user typed) and return the file path.
    pub async fn append(&self, location: &str, report: &WeatherReport) -> Result<PathBuf, AppError> {
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(history_file_name(location));

        let mut history = read_history(&path)
            .await?
            .unwrap_or_else(|| HistoryFile {
                location: location.to_string(),
                searches: Vec::new(),
            });

        history.searches.push(SearchEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            weather_data: report
                .days
                .iter()
                .map(|d| DayRecord {
                    date: d.date,
                    day_temperature: d.day_temperature,
                    night_temperature: d.night_temperature,
                    day_humidity: d.day_humidity,
                    night_humidity: d.night_humidity,
                    location: report.location.name.clone(),
                })
                .collect(),
        });

        let body = serde_json::to_vec_pretty(&history)
            .map_err(|e| AppError::Storage(format!("Failed to serialize history: {}", e)))?;
        write_replacing(&path, &body).await?;

        tracing::debug!(
            "Recorded search #{} for '{}' in {}",
            history.searches.len(),
            location,
            path.display()
        );
        Ok(path)
    }

    /// List every history file, sorted by location.
    pub async fn list(&self) -> Result<Vec<HistoryListing>, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listings = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(file) = entry.file_name().into_string() else {
                continue;
            };
            if !file.ends_with(HISTORY_EXTENSION) {
                continue;
            }
            listings.push(HistoryListing {
                location: location_from_file_name(&file),
                file,
            });
        }

        listings.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(listings)
    }

    /// Raw contents of a history file, validated against path traversal.
    pub async fn read_file(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        if !is_safe_history_file_name(file_name) {
            return Err(AppError::BadRequest(format!(
                "Invalid history file name '{}'",
                file_name
            )));
        }

        match tokio::fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(format!(
                "History file {} not found",
                file_name
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace `path` with `body` via a temp file and rename.
async fn write_replacing(path: &Path, body: &[u8]) -> Result<(), AppError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TEMP_SUFFIX);
    let tmp = PathBuf::from(tmp);

    if let Err(e) = tokio::fs::write(&tmp, body).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Existing history, or `None` when the file is missing or empty.
async fn read_history(path: &Path) -> Result<Option<HistoryFile>, AppError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content).map(Some).map_err(|e| {
        AppError::Storage(format!("Corrupt history file {}: {}", path.display(), e))
    })
}
