//! Time utilities and constants for xrate.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Service timing constants.
pub mod constants {
    /// How far back historical conversions may reach, in days.
    pub const RETENTION_DAYS: i64 = 90;

    /// Scheduled refresh period for the latest table (1 hour).
    pub const REFRESH_INTERVAL_SECS: u64 = 60 * 60;
}

/// Calendar date format used for cache keys, provider requests and query strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Render a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Oldest calendar day still inside a retention window of `days` ending `today`.
pub fn retention_cutoff(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// Source of "now". Production uses [`SystemClock`]; tests pin the day.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// The current UTC calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// A clock stopped at a fixed instant.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

#[cfg(any(test, feature = "test-utils"))]
impl FixedClock {
    /// Stop the clock at midday UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
