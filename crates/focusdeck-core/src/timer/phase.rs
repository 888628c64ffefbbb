use serde::{Deserialize, Serialize};

/// Default work phase length in seconds (25 minutes).
pub const WORK_SECS: u32 = 25 * 60;
/// Short break length in seconds. Not configurable.
pub const SHORT_BREAK_SECS: u32 = 5 * 60;
/// Long break length in seconds. Not configurable.
pub const LONG_BREAK_SECS: u32 = 15 * 60;
/// Work phases per cycle; the last one is followed by a long break.
pub const CYCLES_FOR_LONG: u32 = 4;

/// Upper bound for the minutes field of a custom work duration.
pub const MAX_CUSTOM_MINUTES: u32 = 90;
/// Upper bound for the seconds field of a custom work duration.
pub const MAX_CUSTOM_SECONDS: u32 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionPhase {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionPhase::Work)
    }

    /// Human-readable label, as shown on the timer face.
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Work => "Work Session",
            SessionPhase::ShortBreak => "Short Break",
            SessionPhase::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SessionPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(SessionPhase::Work),
            "short" | "short_break" | "short-break" => Ok(SessionPhase::ShortBreak),
            "long" | "long_break" | "long-break" => Ok(SessionPhase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Phase lengths for one engine. Only the work length varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub work_secs: u32,
}

impl PhaseDurations {
    pub fn new(work_secs: u32) -> Self {
        Self {
            work_secs: if work_secs == 0 { WORK_SECS } else { work_secs },
        }
    }

    pub fn of(&self, phase: SessionPhase) -> u32 {
        match phase {
            SessionPhase::Work => self.work_secs,
            SessionPhase::ShortBreak => SHORT_BREAK_SECS,
            SessionPhase::LongBreak => LONG_BREAK_SECS,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work_secs: WORK_SECS,
        }
    }
}

/// Seconds to whole minutes, halves rounding up.
pub fn round_minutes(secs: u32) -> u32 {
    (secs + 30) / 60
}

/// Clamp raw duration fields into their valid ranges and return total seconds.
///
/// Negative input clamps to zero, oversized input to the field maximum.
pub fn clamp_custom_duration(minutes: i64, seconds: i64) -> u32 {
    let minutes = minutes.clamp(0, MAX_CUSTOM_MINUTES as i64) as u32;
    let seconds = seconds.clamp(0, MAX_CUSTOM_SECONDS as i64) as u32;
    minutes * 60 + seconds
}

/// Parse a user-typed duration field. Anything non-numeric counts as zero.
pub fn parse_duration_field(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_durations_are_fixed() {
        let d = PhaseDurations::new(10 * 60);
        assert_eq!(d.of(SessionPhase::Work), 600);
        assert_eq!(d.of(SessionPhase::ShortBreak), 300);
        assert_eq!(d.of(SessionPhase::LongBreak), 900);
    }

    #[test]
    fn zero_work_length_falls_back_to_default() {
        assert_eq!(PhaseDurations::new(0).work_secs, WORK_SECS);
    }

    #[test]
    fn rounded_minutes() {
        assert_eq!(round_minutes(1500), 25);
        assert_eq!(round_minutes(89), 1);
        assert_eq!(round_minutes(90), 2);
        assert_eq!(round_minutes(29), 0);
    }

    #[test]
    fn clamp_handles_out_of_range_fields() {
        assert_eq!(clamp_custom_duration(-5, -1), 0);
        assert_eq!(clamp_custom_duration(120, 75), 90 * 60 + 59);
        assert_eq!(clamp_custom_duration(10, 30), 630);
    }

    #[test]
    fn parse_field_is_lenient() {
        assert_eq!(parse_duration_field("12"), 12);
        assert_eq!(parse_duration_field(" 7 "), 7);
        assert_eq!(parse_duration_field("3.9"), 3);
        assert_eq!(parse_duration_field("abc"), 0);
        assert_eq!(parse_duration_field("-4"), -4);
    }

    #[test]
    fn phase_from_str() {
        assert_eq!("work".parse::<SessionPhase>().unwrap(), SessionPhase::Work);
        assert_eq!("short".parse::<SessionPhase>().unwrap(), SessionPhase::ShortBreak);
        assert_eq!("Long-Break".parse::<SessionPhase>().unwrap(), SessionPhase::LongBreak);
        assert!("nap".parse::<SessionPhase>().is_err());
    }
}
