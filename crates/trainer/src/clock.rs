use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use time::{Date, OffsetDateTime};

/// Source of monotonic time and the current calendar day.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn today(&self) -> Date;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<(Instant, Date)>>,
}

impl ManualClock {
    pub fn new(today: Date) -> Self {
        Self {
            inner: Arc::new(Mutex::new((Instant::now(), today))),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.0 += by;
    }

    pub fn set_today(&self, today: Date) {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.1 = today;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).0
    }

    fn today(&self) -> Date {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).1
    }
}
