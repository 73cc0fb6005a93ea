use async_trait::async_trait;
use pulse_core::model::ReviewCollection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

use crate::file::JsonFileRepository;
use crate::record;

/// Slot name used when callers do not pick one.
pub const DEFAULT_SLOT: &str = "spaced_repetition_data";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("invalid slot name: {0:?}")]
    InvalidSlot(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check that a slot name is usable by every backend, including as a file stem.
///
/// # Errors
///
/// Returns `StorageError::InvalidSlot` for empty names, names with path
/// separators, or names starting with a dot.
pub fn validate_slot(slot: &str) -> Result<(), StorageError> {
    let bad = slot.trim().is_empty()
        || slot.starts_with('.')
        || slot.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidSlot(slot.to_owned()));
    }
    Ok(())
}

/// One named slot holding a whole review collection.
///
/// Each call is a standalone read or write; callers doing read-modify-write
/// get last-write-wins semantics if they race.
#[async_trait]
pub trait ReviewSlotRepository: Send + Sync {
    /// Name of the slot this repository reads and writes.
    fn slot(&self) -> &str;

    /// Load the stored collection, `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend is unavailable or the stored
    /// payload cannot be decoded.
    async fn load(&self) -> Result<Option<ReviewCollection>, StorageError>;

    /// Replace the stored collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn save(&self, collection: &ReviewCollection) -> Result<(), StorageError>;

    /// Delete the slot. Clearing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend is unavailable.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory slots for tests and prototyping.
///
/// Payloads are kept as encoded JSON so this backend exercises the same
/// record format as the persistent ones. Clones share the same slots.
#[derive(Clone)]
pub struct InMemoryRepository {
    slot: String,
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: DEFAULT_SLOT.to_owned(),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A handle on another slot of the same in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidSlot` if the name is not usable.
    pub fn with_slot(&self, slot: impl Into<String>) -> Result<Self, StorageError> {
        let slot = slot.into();
        validate_slot(&slot)?;
        Ok(Self {
            slot,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Raw JSON stored in this repository's slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw_payload(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&self.slot).cloned())
    }

    /// Store a raw JSON payload in this repository's slot, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw_payload(&self, payload: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(self.slot.clone(), payload.into());
        Ok(())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSlotRepository for InMemoryRepository {
    fn slot(&self) -> &str {
        &self.slot
    }

    async fn load(&self) -> Result<Option<ReviewCollection>, StorageError> {
        let payload = self.raw_payload()?;
        debug!(slot = %self.slot, found = payload.is_some(), "loaded in-memory slot");
        payload.as_deref().map(record::decode).transpose()
    }

    async fn save(&self, collection: &ReviewCollection) -> Result<(), StorageError> {
        let payload = record::encode(collection)?;
        self.put_raw_payload(payload)?;
        debug!(slot = %self.slot, items = collection.len(), "saved in-memory slot");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&self.slot);
        info!(slot = %self.slot, "cleared in-memory slot");
        Ok(())
    }
}

/// Holds the review slot behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub reviews: Arc<dyn ReviewSlotRepository>,
}

impl Storage {
    /// Build a `Storage` keeping each slot as a JSON file under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot name is invalid or the directory
    /// cannot be created.
    pub async fn json_dir(dir: impl AsRef<Path>, slot: &str) -> Result<Self, StorageError> {
        let repo = JsonFileRepository::open(dir.as_ref(), slot).await?;
        let reviews: Arc<dyn ReviewSlotRepository> = Arc::new(repo);
        Ok(Self { reviews })
    }
}
