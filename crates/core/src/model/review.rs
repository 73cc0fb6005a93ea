use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ItemId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when reading a difficulty rating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("unknown difficulty rating: {0:?}")]
    Unknown(String),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Three-level self-assessment of how hard an item was to recall.
///
/// The rating scales the base interval picked by the scheduler:
/// - `Easy`: interval × 1.5, the item comes back later
/// - `Medium`: interval unchanged
/// - `Hard`: interval × 0.5, the item comes back sooner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Interval multiplier as an exact `(numerator, denominator)` ratio.
    #[must_use]
    pub fn multiplier(self) -> (i64, i64) {
        match self {
            Difficulty::Easy => (3, 2),
            Difficulty::Medium => (1, 1),
            Difficulty::Hard => (1, 2),
        }
    }

    /// Numeric score used for averages: easy 3, medium 2, hard 1.
    #[must_use]
    pub fn score(self) -> u8 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 2,
            Difficulty::Hard => 1,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(DifficultyError::Unknown(s.to_owned())),
        }
    }
}

//
// ─── REVIEW ITEM ──────────────────────────────────────────────────────────────
//

/// Scheduling state of one learning item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    id: ItemId,
    last_reviewed: Option<DateTime<Utc>>,
    next_review: Option<DateTime<Utc>>,
    review_count: u32,
    difficulty: Difficulty,
}

impl ReviewItem {
    /// A freshly tracked item: never rated, first due at `first_due`.
    #[must_use]
    pub fn new(id: ItemId, added_at: DateTime<Utc>, first_due: DateTime<Utc>) -> Self {
        Self {
            id,
            last_reviewed: Some(added_at),
            next_review: Some(first_due.max(added_at)),
            review_count: 0,
            difficulty: Difficulty::default(),
        }
    }

    /// Rehydrate an item from storage. No invariants are checked here;
    /// `ReviewCollection::from_persisted` validates the whole set.
    #[must_use]
    pub fn from_persisted(
        id: ItemId,
        last_reviewed: Option<DateTime<Utc>>,
        next_review: Option<DateTime<Utc>>,
        review_count: u32,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id,
            last_reviewed,
            next_review,
            review_count,
            difficulty,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn last_reviewed(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed
    }

    #[must_use]
    pub fn next_review(&self) -> Option<DateTime<Utc>> {
        self.next_review
    }

    #[must_use]
    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// True once the item has been rated at least once.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.review_count > 0
    }

    /// Items without a scheduled review are never due.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_some_and(|next| next <= now)
    }

    /// Record a completed review. Called by the scheduler, which owns the
    /// interval math.
    pub(crate) fn record_review(
        &mut self,
        difficulty: Difficulty,
        reviewed_at: DateTime<Utc>,
        next_review: DateTime<Utc>,
    ) {
        self.last_reviewed = Some(reviewed_at);
        self.next_review = Some(next_review.max(reviewed_at));
        self.review_count = self.review_count.saturating_add(1);
        self.difficulty = difficulty;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
