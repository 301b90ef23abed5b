//! Persistent preference slots on disk
//!
//! Provides a `PreferencesStore` interface with string-valued slots and a
//! file-backed implementation storing one JSON file per slot under an
//! XDG-compliant config directory. Slots may carry an expiry; expired
//! values read back as absent.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Slot holding the last successfully searched city name
pub const LAST_CITY_KEY: &str = "last_city";
/// Slot holding the encoded settings record
pub const SETTINGS_KEY: &str = "settings";
/// Slot holding the recent-search list
pub const RECENT_CITIES_KEY: &str = "recent_cities";

/// Maximum number of recent-search records kept
pub const RECENT_CITIES_MAX: usize = 5;

/// Key-value persistence for user preferences
///
/// An explicit interface injected into the application shell, so the
/// storage primitive can be swapped without touching callers.
pub trait PreferencesStore {
    /// Reads a slot, treating missing, unreadable and expired values as absent
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a slot, optionally with a time-to-live
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> io::Result<()>;
}

/// Wrapper struct for a slot value stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct SlotEntry {
    /// The stored value
    value: String,
    /// When the value was stored
    stored_at: DateTime<Utc>,
    /// When the value expires, if it does
    expires_at: Option<DateTime<Utc>>,
}

/// File-backed preferences store
///
/// Stores each slot as a JSON file in the project config directory
/// (`~/.config/skycast/` on Linux).
#[derive(Debug, Clone)]
pub struct FilePreferencesStore {
    /// Directory where slot files are stored
    dir: PathBuf,
}

impl FilePreferencesStore {
    /// Creates a store using the XDG-compliant config directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g. no home
    /// directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "skycast")?;
        let dir = project_dirs.config_dir().to_path_buf();
        Some(Self { dir })
    }

    /// Creates a store rooted at a custom directory
    ///
    /// Useful for testing or when a specific location is needed.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the path of the file backing a slot
    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Ensures the store directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }
}

impl PreferencesStore for FilePreferencesStore {
    fn get(&self, key: &str) -> Option<String> {
        let content = fs::read_to_string(self.slot_path(key)).ok()?;
        let entry: SlotEntry = serde_json::from_str(&content).ok()?;

        if let Some(expires_at) = entry.expires_at {
            if Utc::now() > expires_at {
                return None;
            }
        }

        Some(entry.value)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> io::Result<()> {
        self.ensure_dir()?;

        let now = Utc::now();
        let expires_at = match ttl {
            Some(ttl) => Some(
                now + chrono::Duration::from_std(ttl)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
            ),
            None => None,
        };
        let entry = SlotEntry {
            value: value.to_string(),
            stored_at: now,
            expires_at,
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(self.slot_path(key), json)
    }
}

/// One recent-search record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentCity {
    pub city: String,
    pub country: String,
}

/// Bounded most-recent-first list of searched cities
///
/// De-duplicated case-insensitively by city name and capped at
/// [`RECENT_CITIES_MAX`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentCities {
    entries: Vec<RecentCity>,
}

impl RecentCities {
    /// Loads the list from its slot, falling back to empty on any problem
    pub fn load(store: &dyn PreferencesStore) -> Self {
        store
            .get(RECENT_CITIES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Persists the list into its slot
    pub fn save(&self, store: &dyn PreferencesStore) -> io::Result<()> {
        let json = serde_json::to_string(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        store.set(RECENT_CITIES_KEY, &json, None)
    }

    /// Records a search, moving it to the front of the list
    pub fn record(&mut self, city: &str, country: &str) {
        self.entries
            .retain(|entry| !entry.city.eq_ignore_ascii_case(city));
        self.entries.insert(
            0,
            RecentCity {
                city: city.to_string(),
                country: country.to_string(),
            },
        );
        self.entries.truncate(RECENT_CITIES_MAX);
    }

    /// The records, most recent first
    pub fn entries(&self) -> &[RecentCity] {
        &self.entries
    }
}
