//! Core data models for Skycast
//!
//! This module contains the data types used throughout the application
//! for representing forecast samples, current conditions, and the daily
//! summaries the dashboard renders.

pub mod openweather;

pub use openweather::{CityMeta, ForecastClient, ForecastError, ForecastResponse, ForecastSample};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A weather condition record as reported by OpenWeatherMap
///
/// The `icon` code is an opaque identifier used to build icon URLs
/// (see [`crate::format::weather_icon_url`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    /// OpenWeatherMap condition id (e.g. 500 for light rain)
    pub id: i64,
    /// Condition group name (e.g. "Rain", "Clear")
    pub main: String,
    /// Human-readable description (e.g. "light rain")
    pub description: String,
    /// Icon code (e.g. "10d")
    pub icon: String,
}

/// Current conditions derived from the earliest sample of a forecast response
///
/// Rebuilt wholesale on every successful fetch; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    /// Temperature rounded to the nearest integer
    pub temp: i32,
    /// Feels-like temperature rounded to the nearest integer
    pub feels_like: i32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed as reported, unrounded
    pub wind_speed: f64,
    /// Condition of the source sample
    pub condition: WeatherCondition,
    /// City name
    pub city: String,
    /// ISO country code
    pub country: String,
    /// Sunrise as an absolute instant
    pub sunrise: DateTime<Utc>,
    /// Sunset as an absolute instant
    pub sunset: DateTime<Utc>,
    /// City UTC offset in seconds
    pub timezone: i32,
}

/// One hour of forecast detail within a day
///
/// Derived 1:1 from the raw samples of that day, with the same per-field
/// rounding rules as the daily aggregate fields they correspond to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlySummary {
    /// Time of the sample
    pub time: DateTime<Utc>,
    /// Temperature rounded to the nearest integer
    pub temp: i32,
    /// Feels-like temperature rounded to the nearest integer
    pub feels_like: i32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed rounded to 1 decimal place
    pub wind_speed: f64,
    /// Probability of precipitation as a rounded percentage (0-100)
    pub pop: u8,
    /// Condition of the sample
    pub condition: WeatherCondition,
}

/// Min/max/avg temperatures for a day
///
/// Each field is rounded independently at aggregation time, so `avg` is an
/// independent mean and need not equal `(min + max) / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempRange {
    pub min: i32,
    pub max: i32,
    pub avg: i32,
}

/// Aggregated forecast for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    /// The calendar day this summary covers
    pub date: NaiveDate,
    /// Weekday name (e.g. "Tuesday")
    pub day_name: String,
    /// Temperature statistics for the day
    pub temp: TempRange,
    /// Mean relative humidity, rounded
    pub humidity: u8,
    /// Mean wind speed, rounded to 1 decimal place
    pub wind_speed: f64,
    /// Representative condition for the day
    pub condition: WeatherCondition,
    /// Maximum probability of precipitation across the day, as a percentage
    pub pop: u8,
    /// Per-sample detail for the day, time-ascending
    pub hourly: Vec<HourlySummary>,
}

/// The aggregation engine's output: current conditions plus daily summaries
///
/// `daily` is sorted ascending by date and bounded to at most 5 entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub current: CurrentSnapshot,
    pub daily: Vec<DailySummary>,
}
