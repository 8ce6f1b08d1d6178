//! Time as an injected port.
//!
//! Aggregates stamp `occurred_at` through this trait rather than calling
//! `Utc::now()` directly, so event timestamps are reproducible under
//! test. `learnly-test-support` provides `FixedClock` as the test
//! counterpart to [`SystemClock`].

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
