//! Command-line interface parsing for Skycast
//!
//! This module handles parsing of CLI arguments using clap, producing a
//! `StartupConfig` that seeds the application's first fetch and optional
//! preference overrides.

use clap::Parser;
use thiserror::Error;

use crate::settings::{TimeFormat, Unit};

/// Environment variable consulted when --api-key is not passed
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified unit system is not recognized
    #[error("Invalid unit: '{0}'. Valid units: metric, imperial")]
    InvalidUnit(String),

    /// The specified clock format is not recognized
    #[error("Invalid time format: '{0}'. Valid formats: 12h, 24h")]
    InvalidTimeFormat(String),

    /// No API key was supplied anywhere
    #[error("No API key supplied. Pass --api-key or set OPENWEATHER_API_KEY")]
    MissingApiKey,
}

/// Skycast - current conditions and a 5-day forecast in your terminal
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Current conditions and a 5-day forecast for any city")]
#[command(version)]
pub struct Cli {
    /// City to show on startup; falls back to the last searched city
    pub city: Option<String>,

    /// Resolve the starting location from this machine's IP address
    #[arg(long)]
    pub locate: bool,

    /// Unit system override: metric or imperial
    #[arg(long, value_name = "UNIT")]
    pub units: Option<String>,

    /// Clock format override: 12h or 24h
    #[arg(long, value_name = "FORMAT")]
    pub time_format: Option<String>,

    /// OpenWeatherMap API key; falls back to $OPENWEATHER_API_KEY
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// City requested on the command line, if any
    pub city: Option<String>,
    /// Whether to start from an IP-derived location
    pub locate: bool,
    /// Unit system override applied on top of persisted settings
    pub unit_override: Option<Unit>,
    /// Clock format override applied on top of persisted settings
    pub time_format_override: Option<TimeFormat>,
    /// API key for the forecast provider
    pub api_key: String,
}

/// Parses a unit string argument into a Unit enum.
pub fn parse_unit_arg(s: &str) -> Result<Unit, CliError> {
    Unit::from_str(s).ok_or_else(|| CliError::InvalidUnit(s.to_string()))
}

/// Parses a time format string argument into a TimeFormat enum.
pub fn parse_time_format_arg(s: &str) -> Result<TimeFormat, CliError> {
    TimeFormat::from_str(s).ok_or_else(|| CliError::InvalidTimeFormat(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    /// * `env_api_key` - The API key from the environment, if set
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an override is invalid or no key is available
    pub fn from_cli(cli: &Cli, env_api_key: Option<String>) -> Result<Self, CliError> {
        let unit_override = cli.units.as_deref().map(parse_unit_arg).transpose()?;
        let time_format_override = cli
            .time_format
            .as_deref()
            .map(parse_time_format_arg)
            .transpose()?;
        let api_key = cli
            .api_key
            .clone()
            .or(env_api_key)
            .ok_or(CliError::MissingApiKey)?;

        Ok(StartupConfig {
            city: cli.city.clone(),
            locate: cli.locate,
            unit_override,
            time_format_override,
            api_key,
        })
    }
}
