use chrono::{DateTime, Duration, Utc};

/// Source of "now" for scheduling. Services hold one so tests can pin time.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock, truncated to whole
    /// milliseconds so it survives a round trip through persisted storage.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        let now = match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        };
        truncate_to_millis(now)
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Drop sub-millisecond precision; persisted timestamps are epoch millis.
#[must_use]
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Converts epoch milliseconds into a timestamp, `None` if out of range.
#[must_use]
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z), in epoch millis.
pub const FIXED_TEST_TIMESTAMP_MS: i64 = 1_700_000_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    from_epoch_millis(FIXED_TEST_TIMESTAMP_MS).expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
