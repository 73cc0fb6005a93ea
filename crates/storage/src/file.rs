//! Review slots kept as JSON files.
//!
//! Directory layout:
//! ```text
//! {dir}/
//! └── {slot}.json      # one collection per slot
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pulse_core::model::ReviewCollection;
use tokio::fs;
use tracing::{debug, info};

use crate::record;
use crate::repository::{ReviewSlotRepository, StorageError, validate_slot};

/// Storage backend writing each slot to `{dir}/{slot}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    slot: String,
    path: PathBuf,
}

impl JsonFileRepository {
    /// Open (creating if needed) `dir` and bind to `slot`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidSlot` for unusable slot names, or
    /// `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: &Path, slot: &str) -> Result<Self, StorageError> {
        validate_slot(slot)?;
        fs::create_dir_all(dir).await?;
        Ok(Self {
            slot: slot.to_owned(),
            path: dir.join(format!("{slot}.json")),
        })
    }

    /// Path of the slot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl ReviewSlotRepository for JsonFileRepository {
    fn slot(&self) -> &str {
        &self.slot
    }

    async fn load(&self) -> Result<Option<ReviewCollection>, StorageError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "slot file missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let collection = record::decode(&content)?;
        debug!(path = %self.path.display(), items = collection.len(), "loaded slot file");
        Ok(Some(collection))
    }

    async fn save(&self, collection: &ReviewCollection) -> Result<(), StorageError> {
        let payload = record::encode(collection)?;

        // Slot file is replaced atomically.
        let tmp = self.temp_path();
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), items = collection.len(), "saved slot file");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "removed slot file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
