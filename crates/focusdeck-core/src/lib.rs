//! # Focusdeck Core Library
//!
//! This library provides the core logic for the Focusdeck pomodoro timer.
//! The CLI binary is a thin layer over the same types.
//!
//! ## Architecture
//!
//! - **Timer**: A one-second countdown state machine cycling through work,
//!   short break and long break phases, plus the clock driver that ticks it
//! - **Control**: Start, pause, reset, manual phase selection and custom work
//!   length, with completions wired to recording and rewards
//! - **Storage**: SQLite-based session and progress persistence, TOML-based
//!   configuration
//! - **Progress**: Points, badges and ranks
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Phase and countdown state machine
//! - [`FocusSession`]: Control surface over the engine
//! - [`LiveSession`]: A `FocusSession` ticked by the real clock
//! - [`Database`]: Session history and progress persistence
//! - [`Config`]: Application configuration management

pub mod blocker;
pub mod control;
pub mod error;
pub mod events;
pub mod live;
pub mod ports;
pub mod progress;
pub mod rewards;
pub mod session;
pub mod storage;
pub mod timer;

pub use blocker::{BlockerState, FocusBlocker};
pub use control::FocusSession;
pub use error::{ConfigError, CoreError, DatabaseError, ExternalError};
pub use events::Event;
pub use live::LiveSession;
pub use ports::{FocusGuard, NoopGuard, ProgressLedger, SessionHistoryStore};
pub use progress::{
    shop_badge, Badge, MemoryLedger, PointEntry, Progress, Rank, Redemption, ShopBadge, BADGE_SHOP,
};
pub use rewards::{Dispatched, RewardDispatcher, MARATHON_BADGE, POMODORO_POINTS, POMODORO_REASON};
pub use session::{SessionKind, SessionRecord, SessionRecorder, RECENT_SESSIONS_CAP};
pub use storage::{Config, Database, Stats};
pub use timer::{ClockDriver, SessionPhase, TickControl, TimerEngine};
