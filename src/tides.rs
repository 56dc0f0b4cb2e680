//! Open-Meteo marine API passthrough for tide heights.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::Config;

/// Hourly sea level relative to mean sea level, the series the front
/// end plots as the tide curve.
const HOURLY_FIELDS: &str = "sea_level_height_msl";

#[derive(Clone)]
pub struct TideSource {
    client: reqwest::Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl TideSource {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.marine_url.clone(),
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
            ("timezone", "auto".to_string()),
        ]
    }

    /// Fetch one day of hourly tide heights, as raw JSON.
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<serde_json::Value> {
        log::info!("Fetching tides for {}", date);

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(date))
            .send()
            .await
            .context("Marine API request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Marine API returned status {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse marine API response")
    }
}
