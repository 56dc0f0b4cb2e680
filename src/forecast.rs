//! Open-Meteo wind forecast passthrough.
//!
//! The front end consumes the Open-Meteo payload directly, so the
//! response body is returned untouched.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::Config;

/// Hourly series requested from Open-Meteo.
const HOURLY_FIELDS: &str = "windspeed_10m,winddirection_10m";
/// AROME for high resolution over the French coast, GFS as the global
/// fallback where AROME has no coverage.
const MODELS: &str = "arome_france,gfs_seamless";

#[derive(Clone)]
pub struct ForecastSource {
    client: reqwest::Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl ForecastSource {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.forecast_url.clone(),
            latitude: config.latitude,
            longitude: config.longitude,
        }
    }

    fn query(&self, date: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("start_date", date.to_string()),
            ("end_date", date.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("models", MODELS.to_string()),
            ("timezone", "auto".to_string()),
        ]
    }

    /// Fetch one day of hourly wind forecast, as raw JSON.
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<serde_json::Value> {
        log::info!("Fetching forecast for {}", date);

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(date))
            .send()
            .await
            .context("Open-Meteo request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Open-Meteo returned status {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Open-Meteo response")
    }
}
