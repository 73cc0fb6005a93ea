use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use pulse_core::{
    model::{Difficulty, ItemId, ReviewCollection, ReviewItem, ReviewStats},
    scheduler::{AppliedReview, ScheduledStates, Scheduler},
    time::Clock,
};
use storage::repository::{ReviewSlotRepository, Storage};

use crate::error::ReviewServiceError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of tracking an item for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The item is new and was stored.
    Added(ReviewItem),
    /// The item was already tracked; nothing was written.
    AlreadyPresent(ReviewItem),
}

impl AddOutcome {
    #[must_use]
    pub fn item(&self) -> &ReviewItem {
        match self {
            AddOutcome::Added(item) | AddOutcome::AlreadyPresent(item) => item,
        }
    }

    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }
}

/// Result of rating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The review was recorded and the item rescheduled.
    Reviewed(AppliedReview),
    /// No item with that id is tracked; nothing was written.
    NotFound,
}

impl UpdateOutcome {
    #[must_use]
    pub fn applied(&self) -> Option<&AppliedReview> {
        match self {
            UpdateOutcome::Reviewed(applied) => Some(applied),
            UpdateOutcome::NotFound => None,
        }
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Tracks learning items and decides when each is next due.
///
/// Every operation is a single read-modify-write of the configured slot.
/// Nothing is cached between calls, so two services on the same slot see
/// each other's writes, and concurrent writers race with last-write-wins.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
    reviews: Arc<dyn ReviewSlotRepository>,
}

impl ReviewService {
    /// Create a service with the default interval table and real-time clock.
    #[must_use]
    pub fn new(reviews: Arc<dyn ReviewSlotRepository>) -> Self {
        Self {
            clock: Clock::default(),
            scheduler: Scheduler::new(),
            reviews,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.reviews))
    }

    /// Replace the interval table.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load the stored collection, creating and storing an empty one if the
    /// slot is empty. Repeated calls return the same state until something
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read or the new
    /// collection cannot be stored.
    pub async fn initialize(&self) -> Result<ReviewCollection, ReviewServiceError> {
        if let Some(existing) = self.load().await? {
            return Ok(existing);
        }

        let collection = ReviewCollection::new(self.now());
        self.save(&collection).await?;
        info!(slot = self.reviews.slot(), "created review collection");
        Ok(collection)
    }

    /// Start tracking `id`. The new item is rated medium and first due one
    /// table step (one day by default) from now.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read or written.
    pub async fn add_item(&self, id: &ItemId) -> Result<AddOutcome, ReviewServiceError> {
        let now = self.now();
        let mut collection = self.load_or_new(now).await?;

        if let Some(existing) = collection.get(id) {
            debug!(item = %id, "item already tracked");
            return Ok(AddOutcome::AlreadyPresent(existing.clone()));
        }

        let item = ReviewItem::new(id.clone(), now, self.scheduler.first_review_at(now));
        collection.insert(item.clone());
        self.save(&collection).await?;

        debug!(item = %id, next_review = ?item.next_review(), "tracking item");
        Ok(AddOutcome::Added(item))
    }

    /// Record a review of `id` rated `difficulty` and reschedule it.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read or written.
    pub async fn update_item(
        &self,
        id: &ItemId,
        difficulty: Difficulty,
    ) -> Result<UpdateOutcome, ReviewServiceError> {
        let now = self.now();
        let mut collection = self.load_or_new(now).await?;
        let Some(item) = collection.get_mut(id) else {
            warn!(item = %id, "review for untracked item ignored");
            return Ok(UpdateOutcome::NotFound);
        };

        let applied = self.scheduler.apply_review(item, difficulty, now);
        self.save(&collection).await?;

        debug!(
            item = %id,
            %difficulty,
            review_count = applied.item.review_count(),
            interval_ms = applied.interval.num_milliseconds(),
            "recorded review"
        );
        Ok(UpdateOutcome::Reviewed(applied))
    }

    /// Items whose next review is at or before now, in storage order.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read.
    pub async fn due_items(&self) -> Result<Vec<ReviewItem>, ReviewServiceError> {
        let now = self.now();
        let Some(collection) = self.load().await? else {
            return Ok(Vec::new());
        };
        Ok(collection.due_items(now).cloned().collect())
    }

    /// Totals for a progress dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read.
    pub async fn review_stats(&self) -> Result<ReviewStats, ReviewServiceError> {
        let now = self.now();
        let collection = self.load_or_new(now).await?;
        Ok(ReviewStats::from_collection(&collection, now))
    }

    /// What each rating would schedule for `id` if reviewed now, without
    /// writing anything. `None` if the item is not tracked.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the slot cannot be read.
    pub async fn preview(
        &self,
        id: &ItemId,
    ) -> Result<Option<ScheduledStates>, ReviewServiceError> {
        let now = self.now();
        let collection = self.load_or_new(now).await?;
        Ok(collection
            .get(id)
            .map(|item| self.scheduler.schedule(item.review_count(), now)))
    }

    /// Delete the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Save` if the slot cannot be cleared.
    pub async fn clear(&self) -> Result<(), ReviewServiceError> {
        self.reviews
            .clear()
            .await
            .map_err(ReviewServiceError::Save)?;
        info!(slot = self.reviews.slot(), "cleared review collection");
        Ok(())
    }

    async fn load(&self) -> Result<Option<ReviewCollection>, ReviewServiceError> {
        self.reviews.load().await.map_err(ReviewServiceError::Load)
    }

    async fn load_or_new(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReviewCollection, ReviewServiceError> {
        Ok(self
            .load()
            .await?
            .unwrap_or_else(|| ReviewCollection::new(now)))
    }

    async fn save(&self, collection: &ReviewCollection) -> Result<(), ReviewServiceError> {
        self.reviews
            .save(collection)
            .await
            .map_err(ReviewServiceError::Save)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pulse_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn service_at(repo: &InMemoryRepository, at: DateTime<Utc>) -> ReviewService {
        ReviewService::new(Arc::new(repo.clone())).with_clock(Clock::fixed(at))
    }

    struct FailingRepository;

    #[async_trait::async_trait]
    impl ReviewSlotRepository for FailingRepository {
        fn slot(&self) -> &str {
            "broken"
        }

        async fn load(&self) -> Result<Option<ReviewCollection>, StorageError> {
            Ok(None)
        }

        async fn save(&self, _collection: &ReviewCollection) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    #[tokio::test]
    async fn initialize_creates_and_persists_empty_collection() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());

        let first = service.initialize().await.unwrap();
        assert!(first.is_empty());
        assert_eq!(first.last_session(), fixed_now());
        assert!(repo.raw_payload().unwrap().is_some());

        let later = service_at(&repo, fixed_now() + Duration::hours(5));
        assert_eq!(later.initialize().await.unwrap(), first);
    }

    #[tokio::test]
    async fn add_item_schedules_one_day_out() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());

        let outcome = service.add_item(&id("card-1")).await.unwrap();
        assert!(outcome.is_added());
        let item = outcome.item();
        assert_eq!(item.review_count(), 0);
        assert_eq!(item.difficulty(), Difficulty::Medium);
        assert_eq!(item.last_reviewed(), Some(fixed_now()));
        assert_eq!(item.next_review(), Some(fixed_now() + Duration::days(1)));
    }

    #[tokio::test]
    async fn duplicate_add_keeps_existing_state() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());
        service.add_item(&id("card-1")).await.unwrap();
        service
            .update_item(&id("card-1"), Difficulty::Hard)
            .await
            .unwrap();
        let before = service.initialize().await.unwrap();

        let later = service_at(&repo, fixed_now() + Duration::days(2));
        let outcome = later.add_item(&id("card-1")).await.unwrap();

        assert!(matches!(outcome, AddOutcome::AlreadyPresent(_)));
        assert_eq!(outcome.item().review_count(), 1);
        let after = later.initialize().await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.len(), 1);
    }

    #[tokio::test]
    async fn easy_first_review_is_thirty_six_hours_out() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());
        service.add_item(&id("card-1")).await.unwrap();

        let outcome = service
            .update_item(&id("card-1"), Difficulty::Easy)
            .await
            .unwrap();

        let applied = outcome.applied().expect("reviewed");
        assert_eq!(applied.item.review_count(), 1);
        assert_eq!(
            applied.item.next_review(),
            Some(fixed_now() + Duration::hours(36))
        );
    }

    #[tokio::test]
    async fn hard_schedules_sooner_than_easy_at_equal_count() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());
        service.add_item(&id("hard")).await.unwrap();
        service.add_item(&id("easy")).await.unwrap();

        for _ in 0..3 {
            service.update_item(&id("hard"), Difficulty::Hard).await.unwrap();
            service.update_item(&id("easy"), Difficulty::Easy).await.unwrap();
        }

        let c = service.initialize().await.unwrap();
        let gap = |name: &str| {
            let item = c.get(&id(name)).unwrap();
            item.next_review().unwrap() - item.last_reviewed().unwrap()
        };
        assert_eq!(c.get(&id("hard")).unwrap().review_count(), 3);
        assert_eq!(c.get(&id("easy")).unwrap().review_count(), 3);
        assert!(gap("hard") < gap("easy"));
    }

    #[tokio::test]
    async fn update_unknown_item_is_not_found_and_writes_nothing() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());

        let outcome = service
            .update_item(&id("nonexistent"), Difficulty::Medium)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert!(repo.raw_payload().unwrap().is_none());

        service.add_item(&id("card-1")).await.unwrap();
        let before = repo.raw_payload().unwrap();
        let outcome = service
            .update_item(&id("nonexistent"), Difficulty::Medium)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(repo.raw_payload().unwrap(), before);
    }

    #[tokio::test]
    async fn due_items_respects_millisecond_boundary() {
        let repo = InMemoryRepository::new();
        service_at(&repo, fixed_now())
            .add_item(&id("a"))
            .await
            .unwrap();
        service_at(&repo, fixed_now() + Duration::milliseconds(1))
            .add_item(&id("b"))
            .await
            .unwrap();

        let at_a = fixed_now() + Duration::days(1);
        let due = service_at(&repo, at_a).due_items().await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id(), &id("a"));

        let due = service_at(&repo, at_a + Duration::milliseconds(1))
            .due_items()
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
    }

    #[tokio::test]
    async fn due_items_on_empty_slot_is_empty_and_read_only() {
        let repo = InMemoryRepository::new();
        let due = service_at(&repo, fixed_now()).due_items().await.unwrap();
        assert!(due.is_empty());
        assert!(repo.raw_payload().unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_average_only_completed_items() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());

        let stats = service.review_stats().await.unwrap();
        assert_eq!(stats.completed_items, 0);
        assert_eq!(stats.average_difficulty, 0.0);

        for name in ["a", "b", "c"] {
            service.add_item(&id(name)).await.unwrap();
        }
        service.update_item(&id("a"), Difficulty::Medium).await.unwrap();
        service.update_item(&id("b"), Difficulty::Medium).await.unwrap();

        let stats = service.review_stats().await.unwrap();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.completed_items, 2);
        assert_eq!(stats.average_difficulty, 2.0);
        assert_eq!(stats.due_items, 0);
        assert_eq!(stats.next_review_at, Some(fixed_now() + Duration::days(1)));
    }

    #[tokio::test]
    async fn clear_then_initialize_is_empty() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());
        service.add_item(&id("a")).await.unwrap();

        service.clear().await.unwrap();
        assert!(service.initialize().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preview_matches_applied_review() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now());
        assert!(service.preview(&id("a")).await.unwrap().is_none());

        service.add_item(&id("a")).await.unwrap();
        let states = service.preview(&id("a")).await.unwrap().unwrap();
        let outcome = service.update_item(&id("a"), Difficulty::Hard).await.unwrap();

        assert_eq!(
            outcome.applied().unwrap().item.next_review(),
            Some(states.select(Difficulty::Hard).next_review)
        );
    }

    #[tokio::test]
    async fn custom_scheduler_is_used() {
        let repo = InMemoryRepository::new();
        let service = service_at(&repo, fixed_now())
            .with_scheduler(Scheduler::try_with_intervals(&[2, 4]).unwrap());

        let added = service.add_item(&id("a")).await.unwrap();
        assert_eq!(
            added.item().next_review(),
            Some(fixed_now() + Duration::days(2))
        );
    }

    #[tokio::test]
    async fn save_failure_surfaces_user_message() {
        let service = ReviewService::new(Arc::new(FailingRepository))
            .with_clock(Clock::fixed(fixed_now()));

        let err = service.add_item(&id("a")).await.unwrap_err();
        assert!(matches!(err, ReviewServiceError::Save(StorageError::Connection(_))));
        assert_eq!(err.user_message(), crate::error::SAVE_FAILED_MESSAGE);

        let err = service.clear().await.unwrap_err();
        assert!(matches!(err, ReviewServiceError::Save(StorageError::Connection(_))));
    }

    #[tokio::test]
    async fn ids_differing_in_whitespace_are_separate_items() {
        let repo = InMemoryRepository::new();
        repo.put_raw_payload(r#"{"items":[{"id":"a"},{"id":"a "},{"id":""}],"lastSession":0}"#)
            .unwrap();
        let service = service_at(&repo, fixed_now());

        assert_eq!(service.review_stats().await.unwrap().total_items, 3);
        assert!(service.add_item(&id(" a")).await.unwrap().is_added());
        assert!(!service.add_item(&id("a ")).await.unwrap().is_added());

        let outcome = service.update_item(&id("a "), Difficulty::Easy).await.unwrap();
        assert_eq!(outcome.applied().unwrap().item.id().as_str(), "a ");
        let c = service.initialize().await.unwrap();
        assert_eq!(c.len(), 4);
        assert_eq!(c.get(&id("a")).unwrap().review_count(), 0);
    }

    #[tokio::test]
    async fn corrupt_slot_surfaces_load_error() {
        let repo = InMemoryRepository::new();
        repo.put_raw_payload("not json").unwrap();
        let err = service_at(&repo, fixed_now())
            .review_stats()
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewServiceError::Load(StorageError::Serialization(_))));
        assert_eq!(err.user_message(), crate::error::LOAD_FAILED_MESSAGE);
    }
}
