use std::time::{Duration, Instant};

use time::Date;
use tracing::debug;

use ledger_domain::PracticeLog;

use crate::persistence::PersistenceStore;

pub const PRACTICE_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Accumulates time spent actively playing into per-day totals.
#[derive(Debug, Clone, Default)]
pub struct PracticeTracker {
    log: PracticeLog,
    session_start: Option<Instant>,
}

impl PracticeTracker {
    pub fn new(log: PracticeLog) -> Self {
        Self {
            log,
            session_start: None,
        }
    }

    pub fn log(&self) -> &PracticeLog {
        &self.log
    }

    pub fn is_active(&self) -> bool {
        self.session_start.is_some()
    }

    pub fn set_active_at(
        &mut self,
        active: bool,
        now: Instant,
        today: Date,
        store: &PersistenceStore,
    ) {
        match (active, self.session_start) {
            (true, None) => self.session_start = Some(now),
            (false, Some(_)) => {
                self.accumulate(now, today, store);
                self.session_start = None;
            }
            _ => {}
        }
    }

    /// Banks elapsed time every [`PRACTICE_FLUSH_INTERVAL`] while active.
    pub fn poll_at(&mut self, now: Instant, today: Date, store: &PersistenceStore) {
        if let Some(deadline) = self.next_deadline() {
            if now >= deadline {
                self.accumulate(now, today, store);
            }
        }
    }

    /// Banks elapsed time right away, e.g. before the process is suspended.
    pub fn flush_at(&mut self, now: Instant, today: Date, store: &PersistenceStore) {
        if self.session_start.is_some() {
            self.accumulate(now, today, store);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session_start.map(|start| start + PRACTICE_FLUSH_INTERVAL)
    }

    fn accumulate(&mut self, now: Instant, today: Date, store: &PersistenceStore) {
        let Some(start) = self.session_start else {
            return;
        };
        let elapsed = now.saturating_duration_since(start).as_secs();
        if elapsed == 0 {
            return;
        }
        self.log.add_seconds(today, elapsed);
        self.session_start = Some(start + Duration::from_secs(elapsed));
        debug!(seconds = elapsed, "banked practice time");
        store.save_practice(&self.log);
    }
}
