mod clock;
mod engine;
mod phase;

pub use clock::{ClockDriver, TickControl};
pub use engine::{Depleted, PhaseTransition, TimerEngine};
pub use phase::{
    clamp_custom_duration, parse_duration_field, round_minutes, PhaseDurations, SessionPhase,
    CYCLES_FOR_LONG, LONG_BREAK_SECS, MAX_CUSTOM_MINUTES, MAX_CUSTOM_SECONDS, SHORT_BREAK_SECS,
    WORK_SECS,
};
