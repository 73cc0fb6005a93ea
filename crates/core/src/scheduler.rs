use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Difficulty, ReviewItem};

/// Milliseconds in one day; all interval math is done in integer millis.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Escalating base intervals, in days, indexed by prior review count.
pub const DEFAULT_INTERVAL_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

/// Longest base interval a custom table may hold (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("interval table must not be empty")]
    EmptyTable,
    #[error("interval {index} must be at least one day")]
    NonPositiveInterval { index: usize },
    #[error("interval {index} is longer than 36500 days")]
    IntervalTooLong { index: usize },
    #[error("interval {index} is shorter than the one before it")]
    DecreasingInterval { index: usize },
}

//
// ─── SCHEDULED STATES ──────────────────────────────────────────────────────────
//

/// One possible outcome of rating an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReview {
    pub next_review: DateTime<Utc>,
    pub interval: Duration,
}

/// What each rating would schedule for an item reviewed at `reviewed_at`.
///
/// ```
/// # use pulse_core::scheduler::Scheduler;
/// # use pulse_core::model::Difficulty;
/// let scheduler = Scheduler::new();
/// let now = chrono::Utc::now();
/// let states = scheduler.schedule(0, now);
/// assert!(states.select(Difficulty::Hard).interval < states.select(Difficulty::Easy).interval);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStates {
    pub reviewed_at: DateTime<Utc>,
    pub easy: ScheduledReview,
    pub medium: ScheduledReview,
    pub hard: ScheduledReview,
}

impl ScheduledStates {
    #[must_use]
    pub fn select(&self, difficulty: Difficulty) -> &ScheduledReview {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

/// Outcome of applying a review to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReview {
    /// The item after the review was recorded.
    pub item: ReviewItem,
    /// When the item was due before this review.
    pub previous_next_review: Option<DateTime<Utc>>,
    pub interval: Duration,
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Fixed-table spaced repetition scheduler.
///
/// The base interval is looked up by how many times the item has already
/// been reviewed, clamped to the last entry of the table, then scaled by the
/// difficulty multiplier (easy ×1.5, medium ×1, hard ×0.5). With the default
/// table the base interval never exceeds 30 days, and an easy rating can
/// stretch it to 45.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    intervals_ms: Vec<i64>,
}

impl Scheduler {
    /// Scheduler with the default 1/3/7/14/30 day table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            intervals_ms: DEFAULT_INTERVAL_DAYS
                .iter()
                .map(|d| i64::from(*d) * MILLIS_PER_DAY)
                .collect(),
        }
    }

    /// Scheduler with a custom table of base intervals, in days.
    ///
    /// # Errors
    ///
    /// - `EmptyTable` if no intervals are given
    /// - `NonPositiveInterval` if an entry is zero
    /// - `IntervalTooLong` if an entry exceeds `MAX_INTERVAL_DAYS`
    /// - `DecreasingInterval` if an entry is shorter than its predecessor
    pub fn try_with_intervals(days: &[u32]) -> Result<Self, SchedulerError> {
        if days.is_empty() {
            return Err(SchedulerError::EmptyTable);
        }
        for (index, d) in days.iter().enumerate() {
            if *d == 0 {
                return Err(SchedulerError::NonPositiveInterval { index });
            }
            if *d > MAX_INTERVAL_DAYS {
                return Err(SchedulerError::IntervalTooLong { index });
            }
            if index > 0 && *d < days[index - 1] {
                return Err(SchedulerError::DecreasingInterval { index });
            }
        }

        Ok(Self {
            intervals_ms: days.iter().map(|d| i64::from(*d) * MILLIS_PER_DAY).collect(),
        })
    }

    /// Base interval for an item that has been reviewed `review_count` times.
    #[must_use]
    pub fn base_interval(&self, review_count: u32) -> Duration {
        Duration::milliseconds(self.base_interval_ms(review_count))
    }

    /// Interval after rating an item with `review_count` prior reviews.
    #[must_use]
    pub fn interval_for(&self, review_count: u32, difficulty: Difficulty) -> Duration {
        let (num, den) = difficulty.multiplier();
        Duration::milliseconds(self.base_interval_ms(review_count) * num / den)
    }

    /// When a newly tracked item first comes due.
    #[must_use]
    pub fn first_review_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        offset(now, self.base_interval(0))
    }

    /// Preview every rating for an item with `review_count` prior reviews.
    #[must_use]
    pub fn schedule(&self, review_count: u32, reviewed_at: DateTime<Utc>) -> ScheduledStates {
        let state = |difficulty| {
            let interval = self.interval_for(review_count, difficulty);
            ScheduledReview {
                next_review: offset(reviewed_at, interval),
                interval,
            }
        };

        ScheduledStates {
            reviewed_at,
            easy: state(Difficulty::Easy),
            medium: state(Difficulty::Medium),
            hard: state(Difficulty::Hard),
        }
    }

    /// Record a review on `item` and reschedule it.
    ///
    /// The interval is chosen from the item's review count before this
    /// review, so the first rating of a new item uses the first table entry.
    pub fn apply_review(
        &self,
        item: &mut ReviewItem,
        difficulty: Difficulty,
        reviewed_at: DateTime<Utc>,
    ) -> AppliedReview {
        let previous_next_review = item.next_review();
        let chosen = *self
            .schedule(item.review_count(), reviewed_at)
            .select(difficulty);

        item.record_review(difficulty, reviewed_at, chosen.next_review);

        AppliedReview {
            item: item.clone(),
            previous_next_review,
            interval: chosen.interval,
        }
    }

    fn base_interval_ms(&self, review_count: u32) -> i64 {
        let last = self.intervals_ms.len() - 1;
        let index = usize::try_from(review_count).map_or(last, |c| c.min(last));
        self.intervals_ms[index]
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn offset(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
