//! Rest timer state machine
//!
//! `RestTimer` holds the countdown state only; something else has to call
//! [`RestTimer::tick`] once per elapsed second while it is running. The
//! application crate drives it from a tokio interval, the WASM bindings from
//! a browser timer.
//!
//! Phases:
//! - Idle: not running, remaining == base
//! - Running
//! - Paused: not running, 0 < remaining != base
//! - Finished: not running, remaining == 0

use crate::validation::is_valid_custom_duration;
use serde::{Deserialize, Serialize};

/// Rest duration used when nothing else was chosen
pub const DEFAULT_REST_SECONDS: u32 = 90;

/// Quick-pick rest durations, in seconds
pub const PRESETS: [u32; 5] = [30, 60, 90, 120, 180];

/// Observable phase of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running or had nothing left; nothing changed
    Ignored,
    /// One second was taken off
    Counted { remaining: u32 },
    /// The countdown reached zero on this tick
    Finished,
}

/// Countdown state of the rest timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    base: u32,
    remaining: u32,
    running: bool,
    finished: bool,
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REST_SECONDS)
    }
}

impl RestTimer {
    /// Idle timer with the given base duration (0 is raised to 1)
    pub fn new(base_seconds: u32) -> Self {
        let base = base_seconds.max(1);
        Self {
            base,
            remaining: base,
            running: false,
            finished: false,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.remaining == 0 {
            TimerPhase::Finished
        } else if self.remaining == self.base {
            TimerPhase::Idle
        } else {
            TimerPhase::Paused
        }
    }

    /// Start or resume. After finishing, the countdown restarts from base.
    pub fn start(&mut self) {
        if self.remaining == 0 {
            self.remaining = self.base;
        }
        self.running = true;
        self.finished = false;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.remaining = self.base;
        self.running = false;
        self.finished = false;
    }

    /// Take one second off a running countdown
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running || self.remaining == 0 {
            return TickOutcome::Ignored;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            self.finished = true;
            TickOutcome::Finished
        } else {
            TickOutcome::Counted {
                remaining: self.remaining,
            }
        }
    }

    /// Switch to a new base duration and stop any run in progress
    pub fn select_preset(&mut self, seconds: u32) {
        if seconds == 0 {
            return;
        }
        self.base = seconds;
        self.remaining = seconds;
        self.running = false;
        self.finished = false;
    }

    /// Same as [`select_preset`](Self::select_preset) for a user-entered
    /// duration. Returns false and changes nothing outside `1..=600`.
    pub fn set_custom(&mut self, total_seconds: u32) -> bool {
        if !is_valid_custom_duration(total_seconds) {
            return false;
        }
        self.select_preset(total_seconds);
        true
    }

    /// Add time in any phase. A finished timer resumes counting.
    pub fn add_time(&mut self, seconds: u32) {
        self.remaining = self.remaining.saturating_add(seconds);
        if self.finished {
            self.finished = false;
            self.running = true;
        }
    }

    /// Remaining fraction of the base duration, clamped to [0, 1]
    pub fn progress(&self) -> f64 {
        if self.base == 0 {
            return 0.0;
        }
        (self.remaining as f64 / self.base as f64).clamp(0.0, 1.0)
    }

    /// Remaining time as (minutes, seconds)
    pub fn display(&self) -> (u32, u32) {
        (self.remaining / 60, self.remaining % 60)
    }

    pub fn is_preset_selected(&self, seconds: u32) -> bool {
        self.base == seconds
    }
}
