//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Message shown to a learner when their progress could not be persisted.
pub const SAVE_FAILED_MESSAGE: &str = "Your progress couldn't be saved. Please try again.";

/// Message shown to a learner when their progress could not be read.
pub const LOAD_FAILED_MESSAGE: &str = "Your progress couldn't be loaded. Please try again.";

/// Errors emitted by `ReviewService`.
///
/// Duplicate adds and reviews of unknown items are not errors; they are
/// reported through `AddOutcome` and `UpdateOutcome`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error("failed to load review progress: {0}")]
    Load(#[source] StorageError),
    #[error("failed to save review progress: {0}")]
    Save(#[source] StorageError),
}

impl ReviewServiceError {
    /// Short, user-facing description suitable for a toast or banner.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            ReviewServiceError::Load(_) => LOAD_FAILED_MESSAGE,
            ReviewServiceError::Save(_) => SAVE_FAILED_MESSAGE,
        }
    }
}

/// Errors emitted while reading store configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("store location must not be empty")]
    EmptyLocation,
    #[error("invalid slot name: {0:?}")]
    InvalidSlot(String),
}

/// Errors emitted while opening the configured store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreOpenError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
