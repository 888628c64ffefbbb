use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::timer::SessionPhase;

/// Every state change of a focus session produces an Event.
/// The UI layer renders them; nothing in the core depends on who listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: SessionPhase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: SessionPhase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// The user picked a phase by hand.
    PhaseSelected {
        phase: SessionPhase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    DurationChanged {
        work_secs: u32,
        at: DateTime<Utc>,
    },
    /// A work phase ran to zero. Carries the record handed to the history store.
    WorkCompleted {
        record: SessionRecord,
        cycle_index: u32,
        at: DateTime<Utc>,
    },
    /// Automatic transition into the next phase.
    PhaseEntered {
        from: SessionPhase,
        phase: SessionPhase,
        cycle_index: u32,
        remaining_secs: u32,
        running: bool,
        at: DateTime<Utc>,
    },
    Snapshot {
        phase: SessionPhase,
        phase_label: String,
        cycle_index: u32,
        cycles_for_long: u32,
        remaining_secs: u32,
        total_secs: u32,
        work_secs: u32,
        running: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::PhaseSelected { .. } => "phase_selected",
            Event::DurationChanged { .. } => "duration_changed",
            Event::WorkCompleted { .. } => "work_completed",
            Event::PhaseEntered { .. } => "phase_entered",
            Event::Snapshot { .. } => "snapshot",
        }
    }
}
