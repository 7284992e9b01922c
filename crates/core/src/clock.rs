// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction so row timestamps are deterministic in tests.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Clock;
    use chrono::{DateTime, Duration, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Manually advanced clock. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct FakeClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeClock {
        /// Starts at the Unix epoch.
        pub fn new() -> Self {
            Self::at(DateTime::<Utc>::UNIX_EPOCH)
        }

        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(now)),
            }
        }

        pub fn advance(&self, by: std::time::Duration) {
            let delta = Duration::from_std(by).unwrap_or(Duration::zero());
            *self.now.lock() += delta;
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock() = now;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
