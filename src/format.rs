//! Display formatting helpers
//!
//! Pure, stateless functions turning numeric and temporal values into the
//! strings the dashboard renders. Rounding happens in the aggregation
//! engine; these functions only attach units and clock conventions.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

use crate::settings::{TimeFormat, Unit};

/// Icon sizes offered by the OpenWeatherMap image CDN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IconSize {
    #[default]
    TwoX,
    FourX,
}

impl IconSize {
    fn as_str(&self) -> &'static str {
        match self {
            IconSize::TwoX => "2x",
            IconSize::FourX => "4x",
        }
    }
}

/// Formats a pre-rounded temperature with its unit suffix
pub fn format_temperature(value: i32, unit: Unit) -> String {
    match unit {
        Unit::Metric => format!("{}°C", value),
        Unit::Imperial => format!("{}°F", value),
    }
}

/// Formats a wind speed with its unit suffix
pub fn format_wind_speed(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Metric => format!("{} m/s", value),
        Unit::Imperial => format!("{} mph", value),
    }
}

/// Formats an instant as a clock string
///
/// The 12-hour form carries an AM/PM marker, the 24-hour form does not.
pub fn format_time<Tz: TimeZone>(instant: &DateTime<Tz>, format: TimeFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match format {
        TimeFormat::TwelveHour => instant.format("%I:%M %p").to_string(),
        TimeFormat::TwentyFourHour => instant.format("%H:%M").to_string(),
    }
}

/// Shifts an absolute instant into a city's wall clock
///
/// Offset-only arithmetic: the instant itself is unchanged, it is merely
/// viewed through a fixed UTC offset. No calendar or DST rules are applied.
/// An out-of-range offset falls back to UTC.
pub fn local_time(offset_seconds: i32, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_seconds).unwrap_or_else(|| Utc.fix());
    instant.with_timezone(&offset)
}

/// URL of the icon image for a condition's icon code
///
/// Pure string templating; the code is not validated.
pub fn weather_icon_url(code: &str, size: IconSize) -> String {
    format!(
        "https://openweathermap.org/img/wn/{}@{}.png",
        code,
        size.as_str()
    )
}
