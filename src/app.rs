//! Application state management for Skycast
//!
//! This module contains the main application state, handling keyboard
//! input, fetch orchestration, and the application of completed fetches.
//! Each fetch carries a monotonically increasing generation id; a result
//! is applied only if its generation is still the latest, so a slow stale
//! response can never overwrite a newer one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::cli::StartupConfig;
use crate::data::{ForecastBundle, ForecastClient, ForecastError, ForecastResponse};
use crate::forecast;
use crate::geo::{GeoError, GeoLocator};
use crate::settings::{self, AppSettings, SETTINGS_MAX_AGE};
use crate::store::{PreferencesStore, RecentCities, LAST_CITY_KEY, SETTINGS_KEY};

/// How often the displayed city-local clock is recomputed
pub const CLOCK_TICK: Duration = Duration::from_secs(10);

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the first fetch to complete
    Loading,
    /// Showing forecast content
    Dashboard,
    /// A fetch failed; the message replaces the content area
    Failed(String),
}

/// Messages sent from fetch tasks back to the main application
#[derive(Debug)]
pub enum FetchEvent {
    /// A forecast fetch finished
    Completed {
        generation: u64,
        result: Result<ForecastResponse, ForecastError>,
    },
    /// Geolocation failed before a fetch could start
    LocateFailed { generation: u64, error: GeoError },
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Active user preferences
    pub settings: AppSettings,
    /// The most recently applied forecast
    pub bundle: Option<ForecastBundle>,
    /// Index of the day whose hourly detail is shown
    pub selected_day: usize,
    /// Search input buffer
    pub input: String,
    /// Whether keystrokes go to the search input
    pub input_active: bool,
    /// Secondary message shown alongside content (e.g. geolocation errors)
    pub inline_message: Option<String>,
    /// Recent searches, most recent first
    pub recent_cities: RecentCities,
    /// Wall-clock instant used for displayed times, refreshed by the tick
    pub now: DateTime<Utc>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Whether a fetch is currently in flight
    pub fetching: bool,
    api_key: String,
    startup_city: Option<String>,
    startup_locate: bool,
    generation: u64,
    client: ForecastClient,
    locator: Arc<Mutex<GeoLocator>>,
    store: Box<dyn PreferencesStore>,
    events_tx: mpsc::Sender<FetchEvent>,
}

impl App {
    /// Creates a new App instance from startup configuration
    ///
    /// Persisted settings are loaded from the store and CLI overrides are
    /// applied on top without being persisted themselves.
    pub fn new(
        config: StartupConfig,
        store: Box<dyn PreferencesStore>,
        events_tx: mpsc::Sender<FetchEvent>,
    ) -> Self {
        let mut loaded =
            settings::decode(store.get(SETTINGS_KEY).as_deref()).unwrap_or_default();
        if let Some(unit) = config.unit_override {
            loaded.unit = unit;
        }
        if let Some(time_format) = config.time_format_override {
            loaded.time_format = time_format;
        }
        let recent_cities = RecentCities::load(store.as_ref());

        Self {
            state: AppState::Loading,
            settings: loaded,
            bundle: None,
            selected_day: 0,
            input: String::new(),
            input_active: false,
            inline_message: None,
            recent_cities,
            now: Utc::now(),
            should_quit: false,
            fetching: false,
            api_key: config.api_key,
            startup_city: config.city,
            startup_locate: config.locate,
            generation: 0,
            client: ForecastClient::new(),
            locator: Arc::new(Mutex::new(GeoLocator::new())),
            store,
            events_tx,
        }
    }

    /// Kicks off the first fetch according to startup configuration
    pub fn start(&mut self) {
        if self.startup_locate {
            self.use_my_location();
            return;
        }
        let city = self
            .startup_city
            .clone()
            .or_else(|| self.store.get(LAST_CITY_KEY));
        match city {
            Some(city) => self.search(city),
            None => {
                self.state = AppState::Dashboard;
                self.inline_message = Some("Press / and type a city name to begin".to_string());
            }
        }
    }

    /// Issues a by-city fetch, superseding any fetch still in flight
    pub fn search(&mut self, city: String) {
        let city = city.trim().to_string();
        if city.is_empty() {
            return;
        }

        self.generation += 1;
        self.fetching = true;
        self.inline_message = None;

        let generation = self.generation;
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let unit = self.settings.unit;
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = client.fetch_by_city(&city, &api_key, unit).await;
            let _ = tx.send(FetchEvent::Completed { generation, result }).await;
        });
    }

    /// Resolves coordinates for this machine, then fetches for them
    ///
    /// A geolocation failure is reported as a `LocateFailed` event rather
    /// than a fetch error, so the caller can fall back to the last city.
    pub fn use_my_location(&mut self) {
        self.generation += 1;
        self.fetching = true;

        let generation = self.generation;
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let unit = self.settings.unit;
        let locator = self.locator.clone();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let located = locator.lock().await.locate().await;
            let event = match located {
                Ok(coords) => {
                    let result = client
                        .fetch_by_coords(coords.lat, coords.lon, &api_key, unit)
                        .await;
                    FetchEvent::Completed { generation, result }
                }
                Err(error) => FetchEvent::LocateFailed { generation, error },
            };
            let _ = tx.send(event).await;
        });
    }

    /// Applies a fetch event, discarding it if a newer fetch was issued since
    pub fn apply_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Completed { generation, result } => {
                if generation != self.generation {
                    // A newer request superseded this one
                    return;
                }
                self.fetching = false;
                match result.and_then(|response| forecast::aggregate(&response)) {
                    Ok(bundle) => {
                        self.selected_day = 0;
                        self.record_success(&bundle);
                        self.bundle = Some(bundle);
                        self.state = AppState::Dashboard;
                    }
                    Err(error) => {
                        // No partial rendering on error
                        self.bundle = None;
                        self.state = AppState::Failed(error.to_string());
                    }
                }
            }
            FetchEvent::LocateFailed { generation, error } => {
                if generation != self.generation {
                    return;
                }
                self.fetching = false;
                match self.known_city() {
                    Some(city) => {
                        self.search(city.clone());
                        self.inline_message =
                            Some(format!("{}. Showing {} instead.", error, city));
                    }
                    None => {
                        if self.bundle.is_none() {
                            self.state = AppState::Failed(error.to_string());
                        } else {
                            self.inline_message = Some(error.to_string());
                        }
                    }
                }
            }
        }
    }

    /// Switches between metric and imperial and re-fetches
    ///
    /// Units are applied server-side, so the current forecast has to be
    /// fetched again under the new system.
    pub fn toggle_units(&mut self) {
        self.settings.unit = self.settings.unit.toggled();
        self.persist_settings();
        if let Some(city) = self.known_city() {
            self.search(city);
        }
    }

    /// Switches between 12h and 24h clocks; display-only, no re-fetch
    pub fn toggle_time_format(&mut self) {
        self.settings.time_format = self.settings.time_format.toggled();
        self.persist_settings();
    }

    /// Refreshes the instant used for displayed clock times
    pub fn tick(&mut self) {
        self.now = Utc::now();
    }

    /// Handles a keyboard event
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.input_active {
            match key.code {
                KeyCode::Char(c) => self.input.push(c),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Enter => {
                    let query = std::mem::take(&mut self.input);
                    self.input_active = false;
                    self.search(query);
                }
                KeyCode::Esc => {
                    self.input.clear();
                    self.input_active = false;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => {
                self.input.clear();
                self.input_active = true;
            }
            KeyCode::Char('g') => self.use_my_location(),
            KeyCode::Char('u') => self.toggle_units(),
            KeyCode::Char('t') => self.toggle_time_format(),
            KeyCode::Left => {
                self.selected_day = self.selected_day.saturating_sub(1);
            }
            KeyCode::Right => {
                let day_count = self
                    .bundle
                    .as_ref()
                    .map(|bundle| bundle.daily.len())
                    .unwrap_or(0);
                if self.selected_day + 1 < day_count {
                    self.selected_day += 1;
                }
            }
            KeyCode::Esc => self.inline_message = None,
            _ => {}
        }
    }

    /// The city to re-fetch or fall back to, if any is known
    fn known_city(&self) -> Option<String> {
        self.bundle
            .as_ref()
            .map(|bundle| bundle.current.city.clone())
            .or_else(|| self.store.get(LAST_CITY_KEY))
    }

    /// Records a successful fetch in the persisted slots
    fn record_success(&mut self, bundle: &ForecastBundle) {
        let _ = self
            .store
            .set(LAST_CITY_KEY, &bundle.current.city, None);
        self.recent_cities
            .record(&bundle.current.city, &bundle.current.country);
        let _ = self.recent_cities.save(self.store.as_ref());
    }

    fn persist_settings(&mut self) {
        let _ = self.store.set(
            SETTINGS_KEY,
            &settings::encode(&self.settings),
            Some(SETTINGS_MAX_AGE),
        );
    }
}
