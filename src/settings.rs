//! User preference settings and their persisted encoding
//!
//! Settings are stored as a percent-encoded JSON string so the value is
//! safe inside a delimiter-sensitive, size-limited persistence slot. The
//! decoder validates each field independently and falls back to defaults,
//! so a partially corrupt record never invalidates the whole thing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a persisted settings record stays valid (about one year)
pub const SETTINGS_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Unit system for temperatures and wind speeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    /// Parses a unit string, returning None for anything unrecognized
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "metric" => Some(Unit::Metric),
            "imperial" => Some(Unit::Imperial),
            _ => None,
        }
    }

    /// The value the OpenWeatherMap `units` query parameter expects
    pub fn as_query(&self) -> &'static str {
        match self {
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        }
    }

    /// The other unit system
    pub fn toggled(&self) -> Self {
        match self {
            Unit::Metric => Unit::Imperial,
            Unit::Imperial => Unit::Metric,
        }
    }
}

/// Clock format for displayed times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    /// Parses a time format string, returning None for anything unrecognized
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "12h" => Some(TimeFormat::TwelveHour),
            "24h" => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }

    /// The persisted/displayed spelling of this format
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }

    /// The other clock format
    pub fn toggled(&self) -> Self {
        match self {
            TimeFormat::TwelveHour => TimeFormat::TwentyFourHour,
            TimeFormat::TwentyFourHour => TimeFormat::TwelveHour,
        }
    }
}

/// User preferences, overwritten wholesale on change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub unit: Unit,
    #[serde(rename = "timeFormat")]
    pub time_format: TimeFormat,
}

/// Loosely-typed shape used to validate persisted settings field by field
///
/// Fields deliberately deserialize as raw JSON values: a wrong-typed field
/// fails its own validation and falls back to the default instead of
/// rejecting the record.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    unit: serde_json::Value,
    #[serde(default, rename = "timeFormat")]
    time_format: serde_json::Value,
}

/// Serializes settings into a percent-encoded JSON string
///
/// No validation is performed; the caller guarantees a well-formed record.
pub fn encode(settings: &AppSettings) -> String {
    let json = serde_json::json!({
        "unit": settings.unit.as_query(),
        "timeFormat": settings.time_format.as_str(),
    });
    urlencoding::encode(&json.to_string()).into_owned()
}

/// Decodes a persisted settings string
///
/// Returns None when the input is absent or not parsable as a settings
/// record at all. A parsable record with invalid fields yields a record
/// where each invalid field is replaced by its default.
pub fn decode(raw: Option<&str>) -> Option<AppSettings> {
    let raw = raw?;
    let decoded = urlencoding::decode(raw).ok()?;
    let parsed: RawSettings = serde_json::from_str(&decoded).ok()?;
    Some(normalize(parsed))
}

/// Validates each field independently, substituting defaults for failures
fn normalize(raw: RawSettings) -> AppSettings {
    AppSettings {
        unit: raw
            .unit
            .as_str()
            .and_then(Unit::from_str)
            .unwrap_or_default(),
        time_format: raw
            .time_format
            .as_str()
            .and_then(TimeFormat::from_str)
            .unwrap_or_default(),
    }
}
