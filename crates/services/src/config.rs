//! Where review progress is stored.
//!
//! The location string accepts three forms:
//! - `memory`: process-local, lost on exit
//! - `sqlite:<path>` or any `sqlite:` URL: one row per slot
//! - anything else: a directory holding one JSON file per slot

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use storage::repository::{DEFAULT_SLOT, InMemoryRepository, Storage, validate_slot};

use crate::error::{ConfigError, StoreOpenError};
use crate::review_service::ReviewService;

/// Environment variable naming the store location.
pub const STORE_ENV: &str = "PULSE_REVIEW_STORE";

/// Environment variable naming the slot inside the store.
pub const SLOT_ENV: &str = "PULSE_REVIEW_SLOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    JsonDir(PathBuf),
    Sqlite(String),
}

impl StoreLocation {
    /// Parse a location string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyLocation` for blank input.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyLocation);
        }
        if trimmed.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }
        if trimmed.starts_with("sqlite:") {
            return Ok(Self::Sqlite(normalize_sqlite_url(trimmed)));
        }
        Ok(Self::JsonDir(PathBuf::from(trimmed)))
    }
}

/// Backend and slot selection for a `ReviewService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub slot: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            slot: DEFAULT_SLOT.to_owned(),
        }
    }
}

impl StoreConfig {
    /// Build a config from a location string and optional slot name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the location is blank or the slot is unusable.
    pub fn new(location: &str, slot: Option<&str>) -> Result<Self, ConfigError> {
        let slot = slot.map_or_else(|| DEFAULT_SLOT.to_owned(), |s| s.trim().to_owned());
        validate_slot(&slot).map_err(|_| ConfigError::InvalidSlot(slot.clone()))?;
        Ok(Self {
            location: StoreLocation::parse(location)?,
            slot,
        })
    }

    /// Read `PULSE_REVIEW_STORE` and `PULSE_REVIEW_SLOT`, falling back to an
    /// in-memory store and the default slot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let location = lookup(STORE_ENV).unwrap_or_else(|| {
            warn!("{STORE_ENV} not set, progress will only be kept in memory");
            "memory".to_owned()
        });
        let slot = lookup(SLOT_ENV);
        if slot.is_none() {
            info!("{SLOT_ENV} not set, using default: {DEFAULT_SLOT}");
        }
        Self::new(&location, slot.as_deref())
    }

    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreOpenError` if the backend cannot be reached or prepared.
    pub async fn open(&self) -> Result<Storage, StoreOpenError> {
        let storage = match &self.location {
            StoreLocation::Memory => {
                let repo = InMemoryRepository::new().with_slot(self.slot.as_str())?;
                Storage {
                    reviews: Arc::new(repo),
                }
            }
            StoreLocation::JsonDir(dir) => Storage::json_dir(dir, &self.slot).await?,
            StoreLocation::Sqlite(url) => Storage::sqlite(url, &self.slot).await?,
        };
        info!(location = ?self.location, slot = %self.slot, "opened review store");
        Ok(storage)
    }

    /// Open the configured backend and wrap it in a `ReviewService`.
    ///
    /// # Errors
    ///
    /// Returns `StoreOpenError` if the backend cannot be opened.
    pub async fn open_service(&self) -> Result<ReviewService, StoreOpenError> {
        Ok(ReviewService::from_storage(&self.open().await?))
    }
}

/// Turn `sqlite:<relative path>` into an absolute `sqlite://` URL that
/// creates the database file on first use. Full URLs pass through.
fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw.to_owned();
    }

    let path_str = raw.strip_prefix("sqlite:").unwrap_or(raw);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}
