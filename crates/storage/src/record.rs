//! JSON shape of a persisted review slot.
//!
//! ```json
//! {
//!   "items": [
//!     {"id": "card-1", "lastReviewed": 1700000000000, "nextReview": 1700086400000,
//!      "reviewCount": 0, "difficulty": "medium"}
//!   ],
//!   "lastSession": 1700000000000
//! }
//! ```
//!
//! Timestamps are epoch milliseconds. `lastReviewed` and `nextReview` are
//! omitted for items that were never scheduled.

use chrono::{DateTime, Utc};
use pulse_core::model::{Difficulty, ItemId, ReviewCollection, ReviewItem};
use pulse_core::time::from_epoch_millis;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn millis_to_datetime(field: &'static str, v: i64) -> Result<DateTime<Utc>, StorageError> {
    from_epoch_millis(v)
        .ok_or_else(|| StorageError::Serialization(format!("{field} out of range: {v}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<i64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl ItemRecord {
    #[must_use]
    pub fn from_item(item: &ReviewItem) -> Self {
        Self {
            id: item.id().to_string(),
            last_reviewed: item.last_reviewed().map(|t| t.timestamp_millis()),
            next_review: item.next_review().map(|t| t.timestamp_millis()),
            review_count: item.review_count(),
            difficulty: item.difficulty(),
        }
    }

    /// Convert the record back into a domain `ReviewItem`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for out-of-range timestamps.
    pub fn into_item(self) -> Result<ReviewItem, StorageError> {
        let id = ItemId::from_persisted(self.id);
        let last_reviewed = self
            .last_reviewed
            .map(|v| millis_to_datetime("lastReviewed", v))
            .transpose()?;
        let next_review = self
            .next_review
            .map(|v| millis_to_datetime("nextReview", v))
            .transpose()?;

        Ok(ReviewItem::from_persisted(
            id,
            last_reviewed,
            next_review,
            self.review_count,
            self.difficulty,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    pub last_session: i64,
}

impl CollectionRecord {
    #[must_use]
    pub fn from_collection(collection: &ReviewCollection) -> Self {
        Self {
            items: collection.items().iter().map(ItemRecord::from_item).collect(),
            last_session: collection.last_session().timestamp_millis(),
        }
    }

    /// Convert the record back into a domain `ReviewCollection`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any item is malformed or the
    /// collection breaks its invariants (duplicate ids, schedule before last review).
    pub fn into_collection(self) -> Result<ReviewCollection, StorageError> {
        let last_session = millis_to_datetime("lastSession", self.last_session)?;
        let items = self
            .items
            .into_iter()
            .map(ItemRecord::into_item)
            .collect::<Result<Vec<_>, _>>()?;
        ReviewCollection::from_persisted(items, last_session).map_err(ser)
    }
}

/// Serialize a collection into its slot payload.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if JSON encoding fails.
pub fn encode(collection: &ReviewCollection) -> Result<String, StorageError> {
    serde_json::to_string(&CollectionRecord::from_collection(collection)).map_err(ser)
}

/// Parse a slot payload back into a collection.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is not a valid record.
pub fn decode(payload: &str) -> Result<ReviewCollection, StorageError> {
    serde_json::from_str::<CollectionRecord>(payload)
        .map_err(ser)?
        .into_collection()
}
