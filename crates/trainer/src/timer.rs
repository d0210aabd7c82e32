use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
}

/// Countdown whose remaining time is derived from elapsed wall time, so a
/// late poll never loses accuracy. Expiry is observed through [`poll_at`],
/// which reports it exactly once per arm cycle.
///
/// [`poll_at`]: CountdownTimer::poll_at
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    state: TimerState,
    enabled: bool,
    duration: Duration,
    time_left: Duration,
    started_at: Option<Instant>,
    deadline: Option<Instant>,
}

/// Converts a settings value to a duration. Non-positive or NaN values are
/// zero and values too large for a `Duration` saturate.
pub fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

impl CountdownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: TimerState::Idle,
            enabled: false,
            duration,
            time_left: duration,
            started_at: None,
            deadline: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Starts counting down the remaining time. Returns `true` when the
    /// countdown expired on the spot because nothing was left.
    pub fn arm_at(&mut self, enabled: bool, duration: Duration, now: Instant) -> bool {
        self.enabled = enabled;
        if duration != self.duration {
            self.duration = duration;
            self.time_left = self.time_left.min(duration);
        }
        if !enabled || self.state == TimerState::Expired {
            return false;
        }
        if self.state == TimerState::Running {
            self.freeze(now);
        }
        if self.time_left.is_zero() {
            self.expire();
            return true;
        }
        self.state = TimerState::Running;
        self.started_at = Some(now);
        // A countdown too long to represent as an instant never expires.
        self.deadline = now.checked_add(self.time_left);
        debug!(time_left_ms = self.time_left.as_millis() as u64, "timer armed");
        false
    }

    /// Stops the countdown, keeping the remaining time. Never fires.
    pub fn disarm_at(&mut self, now: Instant) {
        if self.state == TimerState::Running {
            self.freeze(now);
            self.state = TimerState::Idle;
            debug!(time_left_ms = self.time_left.as_millis() as u64, "timer disarmed");
        }
    }

    pub fn reset(&mut self, duration: Duration) {
        self.state = TimerState::Idle;
        self.duration = duration;
        self.time_left = duration;
        self.started_at = None;
        self.deadline = None;
    }

    /// Returns `true` exactly once, when a running countdown reaches zero.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.state == TimerState::Running && now >= deadline => {
                self.expire();
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn time_left_at(&self, now: Instant) -> Duration {
        match (self.state, self.started_at) {
            (TimerState::Running, Some(started)) => {
                self.time_left.saturating_sub(now.saturating_duration_since(started))
            }
            _ => self.time_left,
        }
    }

    /// Fraction of the countdown remaining, in `[0, 1]`. A disabled timer
    /// reports a full bar.
    pub fn progress_at(&self, now: Instant) -> f32 {
        if !self.enabled || self.duration.is_zero() {
            return 1.0;
        }
        let ratio = self.time_left_at(now).as_secs_f64() / self.duration.as_secs_f64();
        ratio.clamp(0.0, 1.0) as f32
    }

    fn freeze(&mut self, now: Instant) {
        self.time_left = self.time_left_at(now);
        self.started_at = None;
        self.deadline = None;
    }

    fn expire(&mut self) {
        self.state = TimerState::Expired;
        self.time_left = Duration::ZERO;
        self.started_at = None;
        self.deadline = None;
        debug!("timer expired");
    }
}
