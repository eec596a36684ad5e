//! Minimal object storage reader.
//!
//! Objects are fetched with a plain `GET {base_url}/{key}`, which works for
//! public S3-style buckets and any static file host.

use std::time::Duration;

use crate::errors::AppError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl ObjectStoreClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/{}", self.base_url, key.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Object store request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "Object store returned HTTP {} for '{}'",
                response.status(),
                key
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read object '{}': {}", key, e)))?;
        Ok(bytes.to_vec())
    }
}
