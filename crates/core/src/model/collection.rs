use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::ItemId;
use crate::model::review::ReviewItem;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollectionError {
    #[error("item {0} appears more than once")]
    DuplicateItem(ItemId),

    #[error("item {0} is scheduled before its last review")]
    InvalidSchedule(ItemId),
}

/// Every item tracked for spaced repetition, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCollection {
    items: Vec<ReviewItem>,
    last_session: DateTime<Utc>,
}

impl ReviewCollection {
    /// An empty collection whose session started at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            items: Vec::new(),
            last_session: now,
        }
    }

    /// Rehydrate a collection from storage.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::DuplicateItem` if an id repeats, or
    /// `CollectionError::InvalidSchedule` if an item is due before it was last reviewed.
    pub fn from_persisted(
        items: Vec<ReviewItem>,
        last_session: DateTime<Utc>,
    ) -> Result<Self, CollectionError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(CollectionError::DuplicateItem(item.id().clone()));
            }
            if let (Some(last), Some(next)) = (item.last_reviewed(), item.next_review()) {
                if next < last {
                    return Err(CollectionError::InvalidSchedule(item.id().clone()));
                }
            }
        }

        Ok(Self {
            items,
            last_session,
        })
    }

    #[must_use]
    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    #[must_use]
    pub fn last_session(&self) -> DateTime<Utc> {
        self.last_session
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&ReviewItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut ReviewItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Append `item` unless its id is already tracked.
    ///
    /// Returns `false` and leaves the collection untouched on a duplicate.
    pub fn insert(&mut self, item: ReviewItem) -> bool {
        if self.contains(item.id()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Items whose next review is at or before `now`, in storage order.
    pub fn due_items(&self, now: DateTime<Utc>) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter().filter(move |item| item.is_due(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn item(name: &str, next_in: Duration) -> ReviewItem {
        let now = fixed_now();
        ReviewItem::new(id(name), now, now + next_in)
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut c = ReviewCollection::new(fixed_now());
        assert!(c.insert(item("a", Duration::days(1))));
        assert!(!c.insert(item("a", Duration::days(9))));
        assert_eq!(c.len(), 1);
        assert_eq!(
            c.get(&id("a")).unwrap().next_review(),
            Some(fixed_now() + Duration::days(1))
        );
    }

    #[test]
    fn due_items_keeps_storage_order() {
        let mut c = ReviewCollection::new(fixed_now());
        c.insert(item("b", Duration::zero()));
        c.insert(item("future", Duration::milliseconds(1)));
        c.insert(item("a", Duration::zero()));

        let due: Vec<_> = c.due_items(fixed_now()).map(|i| i.id().as_str()).collect();
        assert_eq!(due, vec!["b", "a"]);
    }

    #[test]
    fn from_persisted_rejects_duplicate_ids() {
        let err = ReviewCollection::from_persisted(
            vec![item("a", Duration::days(1)), item("a", Duration::days(2))],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, CollectionError::DuplicateItem(id("a")));
    }

    #[test]
    fn from_persisted_rejects_schedule_before_last_review() {
        let now = fixed_now();
        let broken = ReviewItem::from_persisted(
            id("x"),
            Some(now),
            Some(now - Duration::seconds(1)),
            1,
            Difficulty::Hard,
        );
        let err = ReviewCollection::from_persisted(vec![broken], now).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidSchedule(_)));
    }

    #[test]
    fn from_persisted_accepts_unscheduled_items() {
        let loose = ReviewItem::from_persisted(id("x"), None, None, 0, Difficulty::Medium);
        let c = ReviewCollection::from_persisted(vec![loose], fixed_now()).unwrap();
        assert_eq!(c.due_items(fixed_now()).count(), 0);
    }
}
