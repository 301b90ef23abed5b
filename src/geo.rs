//! IP-based geolocation
//!
//! A single bounded-wait lookup against a public IP-geolocation endpoint,
//! standing in for platform location services. A successful fix is reused
//! for a short window before a fresh lookup is made. Failures are
//! categorized but never fatal; callers fall back to a city query.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Lookup endpoint; answers with the caller's approximate coordinates
const GEOLOCATE_URL: &str = "http://ip-api.com/json";

/// Bounded wait for a location fix
const LOCATE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long an acquired position is reused before a fresh lookup
const POSITION_MAX_AGE: Duration = Duration::from_secs(300);

/// A resolved geographic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Reasons a location fix could not be acquired
#[derive(Debug, Error)]
pub enum GeoError {
    /// The lookup service refused the request
    #[error("Location access denied by the lookup service")]
    Denied,

    /// The lookup ran but produced no usable position
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// The bounded wait elapsed
    #[error("Timed out waiting for a location fix")]
    Timeout,

    /// No usable HTTP client could be constructed
    #[error("Geolocation is not supported in this environment")]
    Unsupported,
}

/// Wire format of the lookup response
#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Acquires and caches the machine's approximate position
#[derive(Debug)]
pub struct GeoLocator {
    client: Option<Client>,
    base_url: String,
    cached: Option<(Coordinates, Instant)>,
}

impl Default for GeoLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoLocator {
    /// Create a new GeoLocator with default settings
    pub fn new() -> Self {
        Self {
            client: Client::builder().timeout(LOCATE_TIMEOUT).build().ok(),
            base_url: GEOLOCATE_URL.to_string(),
            cached: None,
        }
    }

    /// Override the lookup URL, e.g. to point at a local stub server
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Acquires coordinates, reusing a recent fix when one is available
    ///
    /// # Returns
    /// * `Ok(Coordinates)` - A position no older than the reuse window
    /// * `Err(GeoError)` - The categorized reason this single attempt failed
    pub async fn locate(&mut self) -> Result<Coordinates, GeoError> {
        if let Some((coords, acquired_at)) = self.cached {
            if acquired_at.elapsed() <= POSITION_MAX_AGE {
                return Ok(coords);
            }
        }

        let client = self.client.as_ref().ok_or(GeoError::Unsupported)?;

        let response = tokio::time::timeout(LOCATE_TIMEOUT, client.get(&self.base_url).send())
            .await
            .map_err(|_| GeoError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    GeoError::Timeout
                } else {
                    GeoError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(status));
        }

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Unavailable(e.to_string()))?;

        let coords = parse_position(body)?;
        self.cached = Some((coords, Instant::now()));
        Ok(coords)
    }
}

/// Map a non-2xx lookup status to a categorized error
fn status_failure(status: StatusCode) -> GeoError {
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => GeoError::Denied,
        _ => GeoError::Unavailable(
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string()),
        ),
    }
}

/// Extract coordinates from a lookup response body
fn parse_position(body: GeoResponse) -> Result<Coordinates, GeoError> {
    if body.status != "success" {
        let reason = body.message.unwrap_or_else(|| "lookup failed".to_string());
        return Err(GeoError::Unavailable(reason));
    }
    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
        _ => Err(GeoError::Unavailable(
            "response carried no coordinates".to_string(),
        )),
    }
}
