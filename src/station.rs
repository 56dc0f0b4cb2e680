//! Weather-station page client.
//!
//! Fetches the daily observation page from Meteociel for a single
//! station, one calendar day per request.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use std::time::Duration;

use crate::config::Config;

/// Browser-like agent; the station site serves an empty page to
/// default library agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Station page source for daily observation markup.
#[derive(Clone)]
pub struct StationSource {
    client: reqwest::Client,
    base_url: String,
    station_id: u32,
}

impl StationSource {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.station_url.clone(),
            station_id: config.station_id,
        }
    }

    /// Build the observation page URL for a given day.
    ///
    /// The site addresses months zero-indexed: January is `mois2=0`.
    pub fn build_url(&self, date: NaiveDate) -> String {
        format!(
            "{}?code2={}&jour2={}&mois2={}&annee2={}",
            self.base_url,
            self.station_id,
            date.day(),
            date.month0(),
            date.year()
        )
    }

    /// Fetch the raw observation page markup for a day. Single attempt,
    /// no retry: a failure here surfaces directly to the caller.
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<String> {
        let url = self.build_url(date);
        log::info!("Fetching station page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Station page request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Station page returned status {}", response.status());
        }

        response
            .text()
            .await
            .context("Failed to read station page body")
    }
}
