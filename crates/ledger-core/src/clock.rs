//! # Clock and Id Collaborators
//!
//! The ledger never calls `Utc::now()` or generates ids on its own; both
//! come in through these traits so tests can pin time and ids.
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────────────────────┐
//! │ Clock                │      │ IdGenerator                          │
//! │  now()  → UTC instant│      │  next("SAL") → "SAL7F3A9C2B01D4"     │
//! │  today() → local date│      │  unique per call, prefixed by type   │
//! └──────────────────────┘      └──────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" in the deployment's civil time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the deployment's local civil time.
    fn offset(&self) -> FixedOffset;

    /// Today's local calendar date (default transaction date).
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset()).date_naive()
    }
}

/// Wall clock at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock at `hours` east of UTC. Out-of-range offsets fall back to UTC.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(utc_offset);
        SystemClock { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::with_offset_hours(crate::DEFAULT_UTC_OFFSET_HOURS)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, offset_hours: i32) -> Self {
        ManualClock {
            now: Mutex::new(start),
            offset: FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(utc_offset),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

// =============================================================================
// Id Generation
// =============================================================================

/// Produces unique, type-prefixed identifiers.
pub trait IdGenerator: Send + Sync {
    fn next(&self, prefix: &str) -> String;
}

/// `PREFIX` + 12 upper-case hex characters of a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixedIds;

impl IdGenerator for PrefixedIds {
    fn next(&self, prefix: &str) -> String {
        let entropy = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("{}{}", prefix, &entropy[..12])
    }
}

/// Deterministic `PREFIX-000001`, `PREFIX-000002`, … ids.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{:06}", prefix, n)
    }
}
