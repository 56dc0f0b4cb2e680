use once_cell::sync::Lazy;
use serde::Deserialize;

/// Spot and upstream settings. Every field has a default matching the
/// deployed spot; any of them can be overridden through `WINDSPOT_*`
/// env vars (e.g. `WINDSPOT_STATION_ID`).
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Meteociel station code for the observation page.
    #[serde(default = "default_station_id")]
    pub station_id: u32,
    #[serde(default = "default_station_url")]
    pub station_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_marine_url")]
    pub marine_url: String,
    /// Timeout applied to every outbound request, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    /// Directory holding the front-end assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_latitude() -> f64 {
    46.244
}

fn default_longitude() -> f64 {
    -1.561
}

fn default_station_id() -> u32 {
    7315
}

fn default_station_url() -> String {
    "https://www.meteociel.fr/temps-reel/obs_villes.php".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_marine_url() -> String {
    "https://marine-api.open-meteo.com/v1/marine".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

fn default_static_dir() -> String {
    "static".to_string()
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    envy::prefixed("WINDSPOT_")
        .from_env::<Config>()
        .expect("Invalid WINDSPOT_* environment overrides")
});

pub fn config() -> &'static Config {
    &CONFIG
}
