use chrono::{DateTime, Utc};

use crate::model::collection::ReviewCollection;

/// Aggregate figures for a review dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStats {
    pub total_items: usize,
    pub due_items: usize,
    /// Items rated at least once.
    pub completed_items: usize,
    /// Mean difficulty score (easy 3, medium 2, hard 1) over completed
    /// items; `0.0` when nothing has been rated yet.
    pub average_difficulty: f64,
    /// Earliest scheduled review across all items.
    pub next_review_at: Option<DateTime<Utc>>,
}

impl ReviewStats {
    /// Summarize `collection` as of `now`.
    #[must_use]
    pub fn from_collection(collection: &ReviewCollection, now: DateTime<Utc>) -> Self {
        let mut due_items = 0_usize;
        let mut completed_items = 0_usize;
        let mut score_sum = 0_u64;
        let mut next_review_at: Option<DateTime<Utc>> = None;

        for item in collection.items() {
            if item.is_due(now) {
                due_items += 1;
            }
            if item.is_completed() {
                completed_items += 1;
                score_sum += u64::from(item.difficulty().score());
            }
            if let Some(next) = item.next_review() {
                next_review_at = Some(next_review_at.map_or(next, |cur| cur.min(next)));
            }
        }

        // Counts are bounded by the in-memory item list.
        #[allow(clippy::cast_precision_loss)]
        let average_difficulty = if completed_items == 0 {
            0.0
        } else {
            score_sum as f64 / completed_items as f64
        };

        Self {
            total_items: collection.len(),
            due_items,
            completed_items,
            average_difficulty,
            next_review_at,
        }
    }
}
