//! Wall-clock access
//!
//! Services never read the system time directly. They go through a
//! [`Clock`] so habit rollover and id generation can be driven from tests.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of the current local time
pub trait Clock: Send + Sync {
    /// Current instant in the user's local offset
    fn now(&self) -> DateTime<FixedOffset>;

    /// Calendar day the user is currently living in
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by the operating system's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Build a clock from an RFC 3339 string such as `2024-05-01T09:30:00-03:00`
    pub fn at(rfc3339: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap_or_else(|_| Utc::now().fixed_offset());
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.lock();
        *now = *now + by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        // A poisoned clock still holds a valid timestamp
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}

/// Calendar day of a stored UTC timestamp, as seen from `offset`
pub fn local_date(timestamp: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(offset).date_naive()
}

/// Time remaining until the next local midnight after `now`
pub fn until_next_midnight(now: DateTime<FixedOffset>) -> Duration {
    let next_midnight = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| now.offset().from_local_datetime(&naive).single());

    match next_midnight {
        Some(midnight) => (midnight - now).to_std().unwrap_or(Duration::ZERO),
        None => crate::config::ROLLOVER_PERIOD,
    }
}

/// Generate a timestamp id that does not collide with `existing`.
///
/// Ids are the creation time in Unix milliseconds. Two records created in
/// the same millisecond get consecutive values.
pub fn next_id<'a, I>(clock: &dyn Clock, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let mut millis = clock.now().timestamp_millis();

    loop {
        let candidate = millis.to_string();
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}
