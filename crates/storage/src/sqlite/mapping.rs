use chrono::{DateTime, Utc};
use pulse_core::model::ReviewCollection;
use sqlx::Row;

use crate::record;
use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// A `review_slots` row decoded into its collection.
pub(crate) struct SlotRow {
    pub collection: ReviewCollection,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn map_slot_row(row: &sqlx::sqlite::SqliteRow) -> Result<SlotRow, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
    Ok(SlotRow {
        collection: record::decode(&payload)?,
        updated_at,
    })
}
