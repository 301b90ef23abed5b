//! Forecast aggregation engine
//!
//! Transforms the flat series of 3-hourly forecast samples returned by the
//! API into current conditions plus at most five daily summaries. The engine
//! is a pure function of its input: no I/O, no shared state.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};

use crate::data::{
    CurrentSnapshot, DailySummary, ForecastBundle, ForecastError, ForecastResponse, ForecastSample,
    HourlySummary, TempRange, WeatherCondition,
};

/// Maximum number of daily summaries returned
pub const DAILY_HORIZON: usize = 5;

/// Inclusive hour window preferred for the representative condition
const MIDDAY_HOURS: std::ops::RangeInclusive<u32> = 11..=14;

/// Policy for assigning a sample to a calendar day
///
/// The default groups by the UTC date of the sample's timestamp, ignoring
/// the city's own offset. Near midnight this can place a sample on a
/// different day than the city's wall clock would; `CityLocal` buckets by
/// the city's fixed offset instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayKeyStrategy {
    /// UTC calendar date of the sample timestamp
    #[default]
    Utc,
    /// Calendar date after shifting by the city's UTC offset
    CityLocal,
}

/// Aggregates a forecast response using the default UTC day bucketing
pub fn aggregate(response: &ForecastResponse) -> Result<ForecastBundle, ForecastError> {
    aggregate_with(response, DayKeyStrategy::Utc)
}

/// Aggregates a forecast response with an explicit day bucketing policy
///
/// # Arguments
/// * `response` - The decoded API response
/// * `strategy` - How sample timestamps map to calendar days
///
/// # Returns
/// * `Ok(ForecastBundle)` - Current conditions plus up to 5 daily summaries
///   sorted ascending by date
/// * `Err(ForecastError::MalformedResponse)` - If the response holds no
///   samples, a sample carries no condition, or a timestamp is unusable
pub fn aggregate_with(
    response: &ForecastResponse,
    strategy: DayKeyStrategy,
) -> Result<ForecastBundle, ForecastError> {
    if response.list.is_empty() {
        return Err(malformed("forecast contained no samples"));
    }

    let clock = DayClock::new(response.city.timezone, strategy)?;

    // Resolve every timestamp once so the grouping and selection passes
    // below stay infallible
    let mut keyed: Vec<(DateTime<Utc>, &ForecastSample)> = response
        .list
        .iter()
        .map(|sample| Ok((instant(sample.dt)?, sample)))
        .collect::<Result<_, ForecastError>>()?;
    keyed.sort_by_key(|(time, _)| *time);

    let current = current_snapshot(response, &keyed)?;

    // Partition into day buckets; BTreeMap keeps dates ascending
    let mut days: BTreeMap<NaiveDate, Vec<(DateTime<Utc>, &ForecastSample)>> = BTreeMap::new();
    for (time, sample) in keyed {
        days.entry(clock.day_key(time)).or_default().push((time, sample));
    }

    let mut daily = Vec::with_capacity(days.len().min(DAILY_HORIZON));
    for (date, entries) in days {
        if daily.len() == DAILY_HORIZON {
            break;
        }
        daily.push(summarize_day(date, &entries, &clock)?);
    }

    Ok(ForecastBundle { current, daily })
}

/// The clock used to key samples to days and pick the midday window
#[derive(Debug, Clone, Copy)]
struct DayClock {
    offset: Option<FixedOffset>,
}

impl DayClock {
    fn new(timezone: i32, strategy: DayKeyStrategy) -> Result<Self, ForecastError> {
        let offset = match strategy {
            DayKeyStrategy::Utc => None,
            DayKeyStrategy::CityLocal => Some(
                FixedOffset::east_opt(timezone)
                    .ok_or_else(|| malformed("city timezone offset out of range"))?,
            ),
        };
        Ok(Self { offset })
    }

    fn day_key(&self, time: DateTime<Utc>) -> NaiveDate {
        match self.offset {
            None => time.date_naive(),
            Some(offset) => time.with_timezone(&offset).date_naive(),
        }
    }

    fn hour(&self, time: DateTime<Utc>) -> u32 {
        match self.offset {
            None => time.hour(),
            Some(offset) => time.with_timezone(&offset).hour(),
        }
    }
}

/// Builds the current-conditions snapshot from the chronologically-first sample
fn current_snapshot(
    response: &ForecastResponse,
    keyed: &[(DateTime<Utc>, &ForecastSample)],
) -> Result<CurrentSnapshot, ForecastError> {
    let &(_, first) = keyed
        .first()
        .ok_or_else(|| malformed("forecast contained no samples"))?;

    Ok(CurrentSnapshot {
        temp: round_int(first.main.temp),
        feels_like: round_int(first.main.feels_like),
        humidity: round_int(first.main.humidity) as u8,
        wind_speed: first.wind.speed,
        condition: primary_condition(first)?,
        city: response.city.name.clone(),
        country: response.city.country.clone(),
        sunrise: instant(response.city.sunrise)?,
        sunset: instant(response.city.sunset)?,
        timezone: response.city.timezone,
    })
}

/// Computes one daily summary from that day's time-ascending samples
fn summarize_day(
    date: NaiveDate,
    entries: &[(DateTime<Utc>, &ForecastSample)],
    clock: &DayClock,
) -> Result<DailySummary, ForecastError> {
    // entries is non-empty by construction of the day buckets
    let temps: Vec<f64> = entries.iter().map(|(_, s)| s.main.temp).collect();
    let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let humidity_mean = mean(entries.iter().map(|(_, s)| s.main.humidity));
    let wind_mean = mean(entries.iter().map(|(_, s)| s.wind.speed));
    let pop_max = entries
        .iter()
        .map(|(_, s)| s.pop)
        .fold(f64::NEG_INFINITY, f64::max);

    let condition = representative_condition(entries, clock)?;

    let hourly = entries
        .iter()
        .map(|(time, s)| {
            Ok(HourlySummary {
                time: *time,
                temp: round_int(s.main.temp),
                feels_like: round_int(s.main.feels_like),
                humidity: round_int(s.main.humidity) as u8,
                wind_speed: round_tenth(s.wind.speed),
                pop: round_percent(s.pop),
                condition: primary_condition(s)?,
            })
        })
        .collect::<Result<Vec<_>, ForecastError>>()?;

    Ok(DailySummary {
        date,
        day_name: weekday_name(date.weekday()).to_string(),
        temp: TempRange {
            min: round_int(min),
            max: round_int(max),
            avg: round_int(mean(temps.iter().cloned())),
        },
        humidity: round_int(humidity_mean) as u8,
        wind_speed: round_tenth(wind_mean),
        condition,
        pop: round_percent(pop_max),
        hourly,
    })
}

/// Picks the condition that characterizes a whole day
///
/// Prefers the first sample whose bucketing-clock hour falls in the midday
/// window; otherwise falls back to the sample at the middle index.
fn representative_condition(
    entries: &[(DateTime<Utc>, &ForecastSample)],
    clock: &DayClock,
) -> Result<WeatherCondition, ForecastError> {
    let &(_, chosen) = entries
        .iter()
        .find(|(time, _)| MIDDAY_HOURS.contains(&clock.hour(*time)))
        .unwrap_or(&entries[entries.len() / 2]);
    primary_condition(chosen)
}

/// The sample's primary (first) condition record
fn primary_condition(sample: &ForecastSample) -> Result<WeatherCondition, ForecastError> {
    sample
        .weather
        .first()
        .cloned()
        .ok_or_else(|| malformed("sample carries no weather condition"))
}

/// Converts epoch seconds to an instant, rejecting out-of-range values
fn instant(epoch_seconds: i64) -> Result<DateTime<Utc>, ForecastError> {
    match Utc.timestamp_opt(epoch_seconds, 0) {
        chrono::LocalResult::Single(time) => Ok(time),
        _ => Err(malformed("timestamp out of range")),
    }
}

fn malformed(reason: &str) -> ForecastError {
    ForecastError::MalformedResponse(reason.to_string())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    sum / count as f64
}

fn round_int(value: f64) -> i32 {
    value.round() as i32
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round() as u8
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::openweather::{CityMeta, CloudCover, Coord, MainReadings, WindReadings};

    /// 2024-07-01 00:00:00 UTC, a Monday
    const DAY_ONE: i64 = 1_719_792_000;
    const HOUR: i64 = 3600;

    fn condition(main: &str) -> WeatherCondition {
        let (id, description, icon) = match main {
            "Rain" => (500, "light rain", "10d"),
            "Clouds" => (802, "scattered clouds", "03d"),
            _ => (800, "clear sky", "01d"),
        };
        WeatherCondition {
            id,
            main: main.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }
    }

    fn sample(dt: i64, temp: f64, pop: f64, main: &str) -> ForecastSample {
        ForecastSample {
            dt,
            main: MainReadings {
                temp,
                feels_like: temp - 1.0,
                temp_min: temp,
                temp_max: temp,
                pressure: 1015.0,
                humidity: 60.0,
                sea_level: None,
                grnd_level: None,
            },
            weather: vec![condition(main)],
            clouds: CloudCover { all: 50.0 },
            wind: WindReadings {
                speed: 3.0,
                deg: 180.0,
                gust: None,
            },
            visibility: Some(10_000),
            pop,
            dt_txt: String::new(),
        }
    }

    fn response(timezone: i32, list: Vec<ForecastSample>) -> ForecastResponse {
        ForecastResponse {
            cod: "200".to_string(),
            message: 0.0,
            cnt: list.len() as u32,
            list,
            city: CityMeta {
                id: 1,
                name: "Testville".to_string(),
                coord: Coord { lat: 0.0, lon: 0.0 },
                country: "CA".to_string(),
                population: 1000,
                timezone,
                sunrise: DAY_ONE + 5 * HOUR,
                sunset: DAY_ONE + 21 * HOUR,
            },
        }
    }

    /// The two-day fixture: 06:00, 12:00, 18:00 on day one and
    /// 00:00, 12:00, 21:00 on day two, temps [12, 18, 14, 9, 16, 11]
    fn two_day_fixture() -> ForecastResponse {
        response(
            0,
            vec![
                sample(DAY_ONE + 6 * HOUR, 12.0, 0.2, "Clouds"),
                sample(DAY_ONE + 12 * HOUR, 18.0, 0.6, "Rain"),
                sample(DAY_ONE + 18 * HOUR, 14.0, 0.35, "Clear"),
                sample(DAY_ONE + 24 * HOUR, 9.0, 0.0, "Clear"),
                sample(DAY_ONE + 36 * HOUR, 16.0, 0.1, "Clouds"),
                sample(DAY_ONE + 45 * HOUR, 11.0, 0.05, "Clear"),
            ],
        )
    }

    #[test]
    fn test_two_day_fixture_end_to_end() {
        let bundle = aggregate(&two_day_fixture()).expect("Aggregation should succeed");

        assert_eq!(bundle.daily.len(), 2);

        let day_one = &bundle.daily[0];
        assert_eq!(day_one.date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(day_one.day_name, "Monday");
        assert_eq!(day_one.temp, TempRange { min: 12, max: 18, avg: 15 });
        assert_eq!(day_one.condition.main, "Rain");
        assert_eq!(day_one.pop, 60);
        assert_eq!(day_one.hourly.len(), 3);

        let day_two = &bundle.daily[1];
        assert_eq!(day_two.date, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
        assert_eq!(day_two.day_name, "Tuesday");
        assert_eq!(day_two.temp.min, 9);
        assert_eq!(day_two.temp.max, 16);
    }

    #[test]
    fn test_current_comes_from_chronologically_first_sample() {
        let mut fixture = two_day_fixture();
        // Shuffle so the earliest sample is not at index zero
        fixture.list.reverse();

        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        assert_eq!(bundle.current.temp, 12);
        assert_eq!(bundle.current.feels_like, 11);
        assert_eq!(bundle.current.condition.main, "Clouds");
        assert_eq!(bundle.current.city, "Testville");
        assert_eq!(bundle.current.country, "CA");
        assert_eq!(bundle.current.timezone, 0);
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let result = aggregate(&response(0, Vec::new()));
        assert!(matches!(result, Err(ForecastError::MalformedResponse(_))));
    }

    #[test]
    fn test_sample_without_condition_is_malformed() {
        let mut fixture = two_day_fixture();
        fixture.list[1].weather.clear();

        let result = aggregate(&fixture);
        assert!(matches!(result, Err(ForecastError::MalformedResponse(_))));
    }

    #[test]
    fn test_single_sample_day_is_well_formed() {
        let fixture = response(0, vec![sample(DAY_ONE + 9 * HOUR, 13.4, 0.25, "Clear")]);
        let bundle = aggregate(&fixture).expect("Aggregation should succeed");

        assert_eq!(bundle.daily.len(), 1);
        let day = &bundle.daily[0];
        assert_eq!(day.temp, TempRange { min: 13, max: 13, avg: 13 });
        assert_eq!(day.hourly.len(), 1);
        assert_eq!(day.pop, 25);
        assert_eq!(day.condition.main, "Clear");
    }

    #[test]
    fn test_output_is_bounded_to_five_days() {
        let list = (0..8)
            .map(|day| sample(DAY_ONE + day * 24 * HOUR, 15.0, 0.0, "Clear"))
            .collect();
        let bundle = aggregate(&response(0, list)).expect("Aggregation should succeed");

        assert_eq!(bundle.daily.len(), DAILY_HORIZON);
        // The horizon keeps the earliest days, in ascending order
        assert_eq!(bundle.daily[0].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(bundle.daily[4].date, NaiveDate::from_ymd_opt(2024, 7, 5).unwrap());
        for pair in bundle.daily.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_representative_condition_prefers_midday_window() {
        // Samples at 10:00, 13:00 and 19:00; only 13:00 is inside [11, 14]
        let fixture = response(
            0,
            vec![
                sample(DAY_ONE + 10 * HOUR, 10.0, 0.0, "Clouds"),
                sample(DAY_ONE + 13 * HOUR, 15.0, 0.0, "Rain"),
                sample(DAY_ONE + 19 * HOUR, 12.0, 0.0, "Clear"),
            ],
        );
        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        assert_eq!(bundle.daily[0].condition.main, "Rain");
    }

    #[test]
    fn test_representative_condition_falls_back_to_middle_index() {
        // 16:00, 18:00, 20:00, 22:00: no sample in the midday window, so the
        // sample at floor(4 / 2) = index 2 is chosen
        let fixture = response(
            0,
            vec![
                sample(DAY_ONE + 16 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 18 * HOUR, 11.0, 0.0, "Clouds"),
                sample(DAY_ONE + 20 * HOUR, 12.0, 0.0, "Rain"),
                sample(DAY_ONE + 22 * HOUR, 13.0, 0.0, "Clear"),
            ],
        );
        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        assert_eq!(bundle.daily[0].condition.main, "Rain");
    }

    #[test]
    fn test_daily_pop_is_rounded_max_of_fractions() {
        let fixture = response(
            0,
            vec![
                sample(DAY_ONE + 6 * HOUR, 10.0, 0.124, "Clear"),
                sample(DAY_ONE + 9 * HOUR, 10.0, 0.346, "Clear"),
                sample(DAY_ONE + 12 * HOUR, 10.0, 0.001, "Clear"),
            ],
        );
        let bundle = aggregate(&fixture).expect("Aggregation should succeed");

        let day = &bundle.daily[0];
        assert_eq!(day.pop, 35); // round(100 * 0.346)
        // Hourly values are computed independently from each fraction
        assert_eq!(day.hourly[0].pop, 12);
        assert_eq!(day.hourly[1].pop, 35);
        assert_eq!(day.hourly[2].pop, 0);
    }

    #[test]
    fn test_wind_speed_rounding() {
        let mut fixture = response(
            0,
            vec![
                sample(DAY_ONE + 6 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 12 * HOUR, 10.0, 0.0, "Clear"),
            ],
        );
        fixture.list[0].wind.speed = 3.14;
        fixture.list[1].wind.speed = 4.49;

        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        let day = &bundle.daily[0];

        // Daily wind is the mean rounded to one decimal: (3.14 + 4.49) / 2 = 3.815 -> 3.8
        assert!((day.wind_speed - 3.8).abs() < 1e-9);
        // Hourly winds round each reading individually
        assert!((day.hourly[0].wind_speed - 3.1).abs() < 1e-9);
        assert!((day.hourly[1].wind_speed - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_avg_is_independent_mean_with_bounded_skew() {
        let fixture = response(
            0,
            vec![
                sample(DAY_ONE + 6 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 9 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 12 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 15 * HOUR, 14.0, 0.0, "Clear"),
            ],
        );
        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        let temp = bundle.daily[0].temp;

        // mean(10, 10, 10, 14) = 11, while the midpoint would be 12
        assert_eq!(temp, TempRange { min: 10, max: 14, avg: 11 });
        assert!(temp.min <= temp.avg && temp.avg <= temp.max);
        let midpoint = (temp.min + temp.max) / 2;
        assert!((temp.avg - midpoint).abs() <= 1);
    }

    #[test]
    fn test_hourly_entries_are_time_ascending() {
        let mut fixture = two_day_fixture();
        fixture.list.swap(0, 2);

        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        for day in &bundle.daily {
            for pair in day.hourly.windows(2) {
                assert!(pair[0].time < pair[1].time);
            }
        }
    }

    #[test]
    fn test_utc_bucketing_ignores_city_offset() {
        // 23:00 UTC with a +2h city offset: the city's wall clock is already
        // on the next day, but the default strategy keys by the UTC date
        let fixture = response(7200, vec![sample(DAY_ONE + 23 * HOUR, 10.0, 0.0, "Clear")]);

        let bundle = aggregate(&fixture).expect("Aggregation should succeed");
        assert_eq!(bundle.daily[0].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_city_local_bucketing_uses_city_offset() {
        let fixture = response(7200, vec![sample(DAY_ONE + 23 * HOUR, 10.0, 0.0, "Clear")]);

        let bundle = aggregate_with(&fixture, DayKeyStrategy::CityLocal)
            .expect("Aggregation should succeed");
        assert_eq!(bundle.daily[0].date, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
    }

    #[test]
    fn test_city_local_midday_window_uses_city_clock() {
        // At +2h, 09:00 UTC is 11:00 city time and enters the window a
        // sample earlier than the UTC clock would
        let fixture = response(
            7200,
            vec![
                sample(DAY_ONE + 3 * HOUR, 10.0, 0.0, "Clear"),
                sample(DAY_ONE + 9 * HOUR, 15.0, 0.0, "Clouds"),
                sample(DAY_ONE + 12 * HOUR, 12.0, 0.0, "Rain"),
            ],
        );

        let utc_bundle = aggregate(&fixture).expect("Aggregation should succeed");
        let local_bundle = aggregate_with(&fixture, DayKeyStrategy::CityLocal)
            .expect("Aggregation should succeed");

        assert_eq!(utc_bundle.daily[0].condition.main, "Rain");
        assert_eq!(local_bundle.daily[0].condition.main, "Clouds");
    }

    #[test]
    fn test_current_snapshot_sun_times_are_absolute_instants() {
        let bundle = aggregate(&two_day_fixture()).expect("Aggregation should succeed");
        assert_eq!(bundle.current.sunrise, instant(DAY_ONE + 5 * HOUR).unwrap());
        assert_eq!(bundle.current.sunset, instant(DAY_ONE + 21 * HOUR).unwrap());
    }

    #[test]
    fn test_round_tenth() {
        assert!((round_tenth(3.14) - 3.1).abs() < 1e-9);
        assert!((round_tenth(3.15) - 3.2).abs() < 1e-9);
        assert!((round_tenth(0.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_percent_bounds() {
        assert_eq!(round_percent(0.0), 0);
        assert_eq!(round_percent(1.0), 100);
        assert_eq!(round_percent(0.605), 61);
        assert_eq!(round_percent(0.604), 60);
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sat), "Saturday");
    }
}
