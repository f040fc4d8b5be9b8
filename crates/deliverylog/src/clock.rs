//! Business-timezone clock.

use std::cell::Cell;

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound};
use mockable::{Clock as WallClock, DefaultClock};

/// Source of "now" in the business timezone.
pub trait Clock: std::fmt::Debug {
    /// Current instant, truncated to whole seconds.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current business date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock shifted into a fixed business offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Create a clock for the given business offset.
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        DefaultClock.utc().with_timezone(&self.offset).trunc_subsecs(0)
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<FixedOffset>>,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(now.trunc_subsecs(0)),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now.trunc_subsecs(0));
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}
