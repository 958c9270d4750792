//! Logical clock for freshness comparisons.
//!
//! Wall-clock time is too coarse to order edits and builds that happen within
//! the same millisecond, so every freshness stamp in the engine comes from a
//! single monotonically increasing counter instead.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static CLOCK: AtomicU64 = AtomicU64::new(0);

/// A point on the process-wide logical clock.
///
/// Every call to [`Timestamp::now`] returns a value strictly greater than all
/// values returned before it, across all threads.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NonZeroU64);

impl Timestamp {
    /// Advances the clock and returns the new tick.
    pub fn now() -> Self {
        let tick = CLOCK.fetch_add(1, Ordering::SeqCst) + 1;
        Self(NonZeroU64::new(tick).unwrap_or(NonZeroU64::MIN))
    }

    /// Rebuilds a timestamp from its raw tick. Zero means "never" and yields `None`.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw tick value.
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }

    /// Returns `true` if `self` is strictly newer than `other`.
    ///
    /// Anything is newer than "never".
    pub fn is_newer_than(self, other: Option<Timestamp>) -> bool {
        match other {
            Some(other) => self > other,
            None => true,
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A shared, atomically updated "last updated" stamp.
///
/// The owner of a build target holds one handle and bumps it after each
/// successful build; dependents hold clones and read it during their own
/// staleness checks without needing access to the producer itself.
#[derive(Clone, Default)]
pub struct SharedStamp(Arc<AtomicU64>);

impl SharedStamp {
    /// Creates a stamp that has never been set.
    pub fn never() -> Self {
        Self::default()
    }

    /// Returns the current value, or `None` if never set.
    pub fn get(&self) -> Option<Timestamp> {
        Timestamp::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Stores a new value.
    pub fn set(&self, stamp: Timestamp) {
        self.0.store(stamp.as_raw(), Ordering::Release);
    }

    /// Resets the stamp to "never".
    pub fn clear(&self) {
        self.0.store(0, Ordering::Release);
    }

    /// Returns `true` if both handles observe the same underlying stamp.
    pub fn same_as(&self, other: &SharedStamp) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(t) => write!(f, "SharedStamp({t})"),
            None => write!(f, "SharedStamp(never)"),
        }
    }
}
