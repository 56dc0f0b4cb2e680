use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::PathBuf;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::config;
use crate::forecast::ForecastSource;
use crate::observations;
use crate::station::StationSource;
use crate::tides::TideSource;

pub async fn run(address: std::net::SocketAddr) {
    let conf = config();
    let routes = routes(
        StationSource::new(conf),
        ForecastSource::new(conf),
        TideSource::new(conf),
        conf.static_dir.clone(),
    )
    .with(warp::compression::gzip())
    .with(warp::log("windspot"));

    log::info!("Listening on {}", address);
    warp::serve(routes).run(address).await
}

fn routes(
    station: StationSource,
    forecast: ForecastSource,
    tides: TideSource,
    static_dir: String,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let observations_route = warp::path!("api" / "observations")
        .and(warp::get())
        .and(warp::query::<DateQuery>())
        .and(with_source(station))
        .and_then(get_observations);

    let forecast_route = warp::path!("api" / "forecast")
        .and(warp::get())
        .and(warp::query::<DateQuery>())
        .and(with_source(forecast))
        .and_then(get_forecast);

    let tides_route = warp::path!("api" / "tides")
        .and(warp::get())
        .and(warp::query::<DateQuery>())
        .and(with_source(tides))
        .and_then(get_tides);

    let index_route = warp::path::end()
        .and(warp::fs::file(PathBuf::from(&static_dir).join("index.html")));
    let assets_route = warp::path("static").and(warp::fs::dir(static_dir));

    observations_route
        .or(forecast_route)
        .or(tides_route)
        .or(index_route)
        .or(assets_route)
        .recover(rejection)
}

fn with_source<S: Clone + Send + Sync + 'static>(
    source: S,
) -> impl Filter<Extract = (S,), Error = Infallible> + Clone {
    warp::any().map(move || source.clone())
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: String,
}

/// Dates are validated before any upstream call is made.
fn parse_date(raw: &str) -> Result<NaiveDate, Rejection> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| warp::reject::custom(ApiError::InvalidDate(raw.to_owned())))
}

async fn get_observations(
    query: DateQuery,
    station: StationSource,
) -> Result<impl Reply, Rejection> {
    let date = parse_date(&query.date)?;
    let html = station
        .fetch_day(date)
        .await
        .map_err(|e| warp::reject::custom(ApiError::StationUnavailable(e)))?;
    let set = observations::extract(date, &html);
    Ok(warp::reply::json(&set))
}

async fn get_forecast(query: DateQuery, source: ForecastSource) -> Result<impl Reply, Rejection> {
    let date = parse_date(&query.date)?;
    let payload = source
        .fetch_day(date)
        .await
        .map_err(|e| warp::reject::custom(ApiError::UpstreamFailed(e)))?;
    Ok(warp::reply::json(&payload))
}

async fn get_tides(query: DateQuery, source: TideSource) -> Result<impl Reply, Rejection> {
    let date = parse_date(&query.date)?;
    let payload = source
        .fetch_day(date)
        .await
        .map_err(|e| warp::reject::custom(ApiError::UpstreamFailed(e)))?;
    Ok(warp::reply::json(&payload))
}

#[derive(Debug)]
enum ApiError {
    /// Malformed `date` query value.
    InvalidDate(String),
    /// The station page could not be fetched; no detail is leaked.
    StationUnavailable(anyhow::Error),
    /// A passthrough upstream failed; the detail goes to the caller.
    UpstreamFailed(anyhow::Error),
}

impl warp::reject::Reject for ApiError {}

#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.".to_string())
    } else if let Some(api) = err.find::<ApiError>() {
        match api {
            ApiError::InvalidDate(raw) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid date '{}', expected YYYY-MM-DD.", raw),
            ),
            ApiError::StationUnavailable(e) => {
                log::error!("Station fetch failed: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Weather station is unreachable.".to_string(),
                )
            }
            ApiError::UpstreamFailed(e) => {
                log::error!("Upstream fetch failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Upstream request failed: {:#}", e),
                )
            }
        }
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "Missing or invalid query parameters.".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error.".to_string(),
        )
    };

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        message,
    });

    Ok(warp::reply::with_status(json, code))
}
