//! Phase state machine.
//!
//! The engine counts down in whole seconds and knows nothing about wall-clock
//! time; something else (the [`ClockDriver`](super::ClockDriver) in
//! production, a plain loop in tests) calls `tick()` once per second.
//!
//! ## Transitions
//!
//! ```text
//! Work (cycle < 4)  -> ShortBreak
//! Work (cycle == 4) -> LongBreak
//! ShortBreak        -> Work, cycle + 1
//! LongBreak         -> Work, cycle = 1
//! ```
//!
//! Depletion is split in two steps. `tick()` reaching zero halts the
//! countdown and reports [`Depleted`]; the caller runs whatever completion
//! side effects it owns and then calls `advance()` to enter the next phase.
//! While depleted, further ticks are ignored, so overlapping ticks can never
//! complete the same phase twice.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{PhaseDurations, SessionPhase, CYCLES_FOR_LONG};
use crate::events::Event;

/// A phase whose countdown just hit zero and has not yet been left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depleted {
    pub phase: SessionPhase,
    /// Cycle index of the phase that ran out.
    pub cycle_index: u32,
    /// Configured length of the phase that ran out.
    pub duration_secs: u32,
}

/// Result of leaving a depleted phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub cycle_index: u32,
    pub remaining_secs: u32,
}

/// Timer state plus the rules that move it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    phase: SessionPhase,
    cycle_index: u32,
    durations: PhaseDurations,
    remaining_secs: u32,
    running: bool,
    /// Set between a depleting tick and the matching `advance()`.
    #[serde(default)]
    depleted: Option<Depleted>,
}

impl TimerEngine {
    /// Create an engine in `Work`, cycle 1, with a full countdown.
    pub fn new(work_secs: u32) -> Self {
        let durations = PhaseDurations::new(work_secs);
        Self {
            phase: SessionPhase::Work,
            cycle_index: 1,
            remaining_secs: durations.work_secs,
            durations,
            running: false,
            depleted: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted.is_some()
    }

    pub fn work_secs(&self) -> u32 {
        self.durations.work_secs
    }

    pub fn duration_of(&self, phase: SessionPhase) -> u32 {
        self.durations.of(phase)
    }

    /// Length of the active phase.
    pub fn total_secs(&self) -> u32 {
        self.durations.of(self.phase)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::Snapshot {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            cycle_index: self.cycle_index,
            cycles_for_long: CYCLES_FOR_LONG,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            work_secs: self.durations.work_secs,
            running: self.running,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns false if the engine is depleted and must `advance()` first.
    pub fn set_running(&mut self, running: bool) -> bool {
        if running && self.depleted.is_some() {
            return false;
        }
        self.running = running;
        true
    }

    /// Count down one second.
    ///
    /// Returns `Some` exactly once per phase, on the tick that reaches zero.
    /// The countdown is halted before returning.
    pub fn tick(&mut self) -> Option<Depleted> {
        if !self.running || self.depleted.is_some() || self.remaining_secs == 0 {
            return None;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }
        self.running = false;
        let depleted = Depleted {
            phase: self.phase,
            cycle_index: self.cycle_index,
            duration_secs: self.total_secs(),
        };
        self.depleted = Some(depleted);
        Some(depleted)
    }

    /// Leave a depleted phase. No-op (returns `None`) when nothing is depleted.
    pub fn advance(&mut self) -> Option<PhaseTransition> {
        let depleted = self.depleted.take()?;
        let (next, cycle) = match depleted.phase {
            SessionPhase::Work if self.cycle_index >= CYCLES_FOR_LONG => {
                (SessionPhase::LongBreak, self.cycle_index)
            }
            SessionPhase::Work => (SessionPhase::ShortBreak, self.cycle_index),
            SessionPhase::ShortBreak => (SessionPhase::Work, self.cycle_index + 1),
            SessionPhase::LongBreak => (SessionPhase::Work, 1),
        };
        self.cycle_index = cycle;
        self.enter(next);
        tracing::debug!(
            from = ?depleted.phase,
            to = ?next,
            cycle_index = cycle,
            "phase transition"
        );
        Some(PhaseTransition {
            from: depleted.phase,
            to: next,
            cycle_index: cycle,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Manual phase override. Keeps the cycle index and the running flag.
    pub fn select_phase(&mut self, phase: SessionPhase) {
        self.depleted = None;
        self.enter(phase);
    }

    /// Replace the work length and restart in `Work`.
    ///
    /// Returns false and changes nothing when `work_secs` is zero.
    pub fn set_work_secs(&mut self, work_secs: u32) -> bool {
        if work_secs == 0 {
            return false;
        }
        self.durations.work_secs = work_secs;
        self.depleted = None;
        self.enter(SessionPhase::Work);
        true
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.depleted = None;
        self.cycle_index = 1;
        self.enter(SessionPhase::Work);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// The single place `remaining_secs` is refilled.
    fn enter(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.remaining_secs = self.durations.of(phase);
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(super::phase::WORK_SECS)
    }
}
