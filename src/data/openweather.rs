//! OpenWeatherMap forecast API client
//!
//! This module provides functionality to fetch 5-day/3-hour forecast data
//! from the OpenWeatherMap API and parse it into wire-format structs that
//! the aggregation engine consumes.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WeatherCondition;
use crate::settings::Unit;

/// Base URL for the OpenWeatherMap API
const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Errors that can occur when fetching or interpreting forecast data
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The API rejected the supplied key
    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidApiKey,

    /// No city matched the query
    #[error("City not found. Please check the city name.")]
    CityNotFound,

    /// The API answered with an unexpected status
    #[error("Failed to fetch weather data: {0}")]
    Upstream(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response decoded but its content is unusable
    #[error("Malformed forecast response: {0}")]
    MalformedResponse(String),
}

/// One raw forecast data point (3-hour granularity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Forecast timestamp, epoch seconds
    pub dt: i64,
    /// Temperature readings for this sample
    pub main: MainReadings,
    /// Conditions for this sample; the first entry is the primary one
    pub weather: Vec<WeatherCondition>,
    /// Cloud cover
    pub clouds: CloudCover,
    /// Wind readings
    pub wind: WindReadings,
    /// Average visibility in metres
    pub visibility: Option<u32>,
    /// Probability of precipitation, 0-1 fraction
    #[serde(default)]
    pub pop: f64,
    /// Timestamp as text, as sent by the API
    pub dt_txt: String,
}

/// Temperature and atmosphere readings within a sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
}

/// Wind readings within a sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindReadings {
    pub speed: f64,
    pub deg: f64,
    pub gust: Option<f64>,
}

/// Cloud cover percentage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudCover {
    pub all: f64,
}

/// City metadata attached to a forecast response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityMeta {
    pub id: i64,
    pub name: String,
    pub coord: Coord,
    pub country: String,
    #[serde(default)]
    pub population: i64,
    /// UTC offset in seconds
    pub timezone: i32,
    /// Sunrise, epoch seconds
    pub sunrise: i64,
    /// Sunset, epoch seconds
    pub sunset: i64,
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// Full forecast response from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub cod: String,
    #[serde(default)]
    pub message: f64,
    pub cnt: u32,
    pub list: Vec<ForecastSample>,
    pub city: CityMeta,
}

/// Client for fetching forecast data from OpenWeatherMap
///
/// Each fetch issues exactly one request; failures are terminal for that
/// attempt and surface as [`ForecastError`] for the caller to report.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    /// Create a new ForecastClient with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: OPENWEATHER_BASE_URL.to_string(),
        }
    }

    /// Create a new ForecastClient with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: OPENWEATHER_BASE_URL.to_string(),
        }
    }

    /// Override the base URL, e.g. to point at a local stub server
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the 5-day forecast for a city by name
    ///
    /// # Arguments
    /// * `city` - Free-text city query, percent-encoded before sending
    /// * `api_key` - OpenWeatherMap API key
    /// * `unit` - Unit system the API should convert values to
    ///
    /// # Returns
    /// * `Ok(ForecastResponse)` - The decoded forecast
    /// * `Err(ForecastError)` - Categorized per HTTP status: 401 maps to
    ///   `InvalidApiKey`, 404 to `CityNotFound`, anything else non-2xx to
    ///   `Upstream` carrying the status text
    pub async fn fetch_by_city(
        &self,
        city: &str,
        api_key: &str,
        unit: Unit,
    ) -> Result<ForecastResponse, ForecastError> {
        let url = format!(
            "{}/forecast?q={}&appid={}&units={}",
            self.base_url,
            urlencoding::encode(city),
            api_key,
            unit.as_query()
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(city_status_failure(status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the 5-day forecast for a pair of coordinates
    ///
    /// Unlike the by-city path, this does not distinguish 401/404; every
    /// non-2xx status maps to `Upstream`.
    pub async fn fetch_by_coords(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
        unit: Unit,
    ) -> Result<ForecastResponse, ForecastError> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&appid={}&units={}",
            self.base_url,
            lat,
            lon,
            api_key,
            unit.as_query()
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Upstream(status_text(status)));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map a non-2xx status on the by-city path to a domain error
fn city_status_failure(status: StatusCode) -> ForecastError {
    match status {
        StatusCode::UNAUTHORIZED => ForecastError::InvalidApiKey,
        StatusCode::NOT_FOUND => ForecastError::CityNotFound,
        _ => ForecastError::Upstream(status_text(status)),
    }
}

/// Human-readable status text, falling back to the numeric code
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
