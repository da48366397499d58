//! Demo transport
//!
//! Stopped -> Running on play, Running -> Paused on pause, Paused -> Running on
//! play, Running/Paused -> Stopped on stop or when the session deadline passes.
//! Commands that do not apply to the current state are ignored.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Longest demo session, counting running time only (ms)
pub const MAX_SESSION_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DemoRunState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Simulated-time offset driven by wall-clock ticks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoClock {
    state: DemoRunState,
    /// Accumulated simulated time (ms)
    offset_ms: i64,
    /// Wall clock at the previous tick
    last_tick_ms: i64,
    /// Running time since the last stopped -> running transition
    session_ms: i64,
    max_session_ms: i64,
}

impl DemoClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            state: DemoRunState::Stopped,
            offset_ms: 0,
            last_tick_ms: now_ms,
            session_ms: 0,
            max_session_ms: MAX_SESSION_MS,
        }
    }

    pub fn with_max_session(mut self, max_session_ms: i64) -> Self {
        self.max_session_ms = max_session_ms.max(0);
        self
    }

    pub fn state(&self) -> DemoRunState {
        self.state
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn is_running(&self) -> bool {
        self.state == DemoRunState::Running
    }

    pub fn play(&mut self, now_ms: i64) -> DemoRunState {
        match self.state {
            DemoRunState::Stopped => {
                self.session_ms = 0;
                self.last_tick_ms = now_ms;
                self.state = DemoRunState::Running;
                info!("Demo started at offset {} ms", self.offset_ms);
            }
            DemoRunState::Paused => {
                // Time spent paused is not simulated
                self.last_tick_ms = now_ms;
                self.state = DemoRunState::Running;
                info!("Demo resumed at offset {} ms", self.offset_ms);
            }
            DemoRunState::Running => {
                // Already running
            }
        }
        self.state
    }

    pub fn pause(&mut self, now_ms: i64) -> DemoRunState {
        match self.state {
            DemoRunState::Running => {
                self.advance(now_ms);
                self.state = DemoRunState::Paused;
                info!("Demo paused at offset {} ms", self.offset_ms);
            }
            DemoRunState::Paused | DemoRunState::Stopped => {
                // Nothing to pause
            }
        }
        self.state
    }

    /// Stop keeps the offset; see [`DemoClock::reset`]
    pub fn stop(&mut self, now_ms: i64) -> DemoRunState {
        match self.state {
            DemoRunState::Running => {
                self.advance(now_ms);
                self.halt("stopped");
            }
            DemoRunState::Paused => {
                self.last_tick_ms = now_ms;
                self.halt("stopped");
            }
            DemoRunState::Stopped => {
                // Already stopped
            }
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.offset_ms = 0;
        debug!("Demo offset reset");
    }

    /// Advance simulated time by the wall clock elapsed since the last tick
    pub fn tick(&mut self, now_ms: i64) -> DemoRunState {
        match self.state {
            DemoRunState::Running => {
                self.advance(now_ms);
                if self.session_ms >= self.max_session_ms {
                    self.halt("reached its maximum session length");
                }
            }
            DemoRunState::Paused | DemoRunState::Stopped => {
                self.last_tick_ms = now_ms;
            }
        }
        self.state
    }

    /// Follow the wall clock without simulating the elapsed time
    pub fn hold(&mut self, now_ms: i64) {
        self.last_tick_ms = now_ms;
    }

    fn advance(&mut self, now_ms: i64) {
        // A clock that steps backwards adds nothing
        let delta = (now_ms - self.last_tick_ms).max(0);
        self.offset_ms = self.offset_ms.saturating_add(delta);
        self.session_ms = self.session_ms.saturating_add(delta);
        self.last_tick_ms = now_ms;
    }

    fn halt(&mut self, reason: &str) {
        self.state = DemoRunState::Stopped;
        self.session_ms = 0;
        info!("Demo {} at offset {} ms", reason, self.offset_ms);
    }
}

impl Default for DemoClock {
    fn default() -> Self {
        Self::new(0)
    }
}
