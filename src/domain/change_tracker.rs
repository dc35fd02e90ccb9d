//! Change detection over the source database's tuple counters.
//!
//! The replication watcher reads `SUM(n_tup_ins + n_tup_upd + n_tup_del)`
//! across `pg_stat_user_tables` each tick and feeds it to a
//! [`ChangeTracker`], which decides whether a dump/restore is due.

/// Outcome of feeding one counter reading to a [`ChangeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    /// First reading since startup; it becomes the baseline.
    Baseline(i64),
    /// Same value as the baseline.
    Unchanged,
    /// The counter grew since the baseline; replication is due.
    Increased {
        /// Baseline value.
        previous: i64,
        /// Value just read.
        current: i64,
    },
    /// The counter went backwards (statistics were reset); the new value
    /// becomes the baseline.
    Reset {
        /// Baseline before the reset.
        previous: i64,
        /// Value just read.
        current: i64,
    },
}

/// Remembers the last change-counter value replication was based on.
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    last: Option<i64>,
}

impl ChangeTracker {
    /// Creates a tracker with no baseline.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Returns the current baseline, if any.
    #[must_use]
    pub const fn baseline(&self) -> Option<i64> {
        self.last
    }

    /// Classifies a new reading.
    ///
    /// [`ChangeVerdict::Increased`] does not advance the baseline;
    /// the caller advances it with [`ChangeTracker::commit`] once the
    /// replication attempt is over.
    pub fn observe(&mut self, current: i64) -> ChangeVerdict {
        match self.last {
            None => {
                self.last = Some(current);
                ChangeVerdict::Baseline(current)
            }
            Some(previous) if current > previous => ChangeVerdict::Increased { previous, current },
            Some(previous) if current < previous => {
                self.last = Some(current);
                ChangeVerdict::Reset { previous, current }
            }
            Some(_) => ChangeVerdict::Unchanged,
        }
    }

    /// Records `current` as the new baseline.
    pub fn commit(&mut self, current: i64) {
        self.last = Some(current);
    }
}
