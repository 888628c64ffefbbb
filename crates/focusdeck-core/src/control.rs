//! Focus session control surface.
//!
//! [`FocusSession`] owns the timer engine and wires completions to the
//! session recorder and reward dispatcher. Every operation is synchronous;
//! external calls are spawned onto an internal task set and never awaited
//! by the timer. Call everything from inside a tokio runtime.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::events::Event;
use crate::ports::{FocusGuard, NoopGuard, ProgressLedger, SessionHistoryStore};
use crate::rewards::RewardDispatcher;
use crate::session::{SessionRecord, SessionRecorder};
use crate::storage::Config;
use crate::timer::{
    clamp_custom_duration, parse_duration_field, round_minutes, SessionPhase, TimerEngine,
    WORK_SECS,
};

pub struct FocusSession {
    engine: TimerEngine,
    recorder: SessionRecorder,
    dispatcher: RewardDispatcher,
    guard: Arc<dyn FocusGuard>,
    auto_advance: bool,
    tasks: JoinSet<()>,
    events: Option<broadcast::Sender<Event>>,
}

impl FocusSession {
    pub fn new(ledger: Arc<dyn ProgressLedger>, store: Arc<dyn SessionHistoryStore>) -> Self {
        Self {
            engine: TimerEngine::new(WORK_SECS),
            recorder: SessionRecorder::new(store),
            dispatcher: RewardDispatcher::new(ledger),
            guard: Arc::new(NoopGuard),
            auto_advance: false,
            tasks: JoinSet::new(),
            events: None,
        }
    }

    /// Build a session from the `[timer]` and `[rewards]` config sections.
    pub fn from_config(
        config: &Config,
        ledger: Arc<dyn ProgressLedger>,
        store: Arc<dyn SessionHistoryStore>,
    ) -> Self {
        let mut session = Self::new(Arc::clone(&ledger), store)
            .with_auto_advance(config.timer.auto_advance);
        session.dispatcher = RewardDispatcher::with_points(ledger, config.rewards.pomodoro_points);
        session.engine = TimerEngine::new(config.timer.work_secs());
        session
    }

    pub fn with_guard(mut self, guard: Arc<dyn FocusGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Publish every event on `sender` as well as returning it.
    pub fn with_events(mut self, sender: broadcast::Sender<Event>) -> Self {
        self.events = Some(sender);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    pub fn cycle_index(&self) -> u32 {
        self.engine.cycle_index()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.engine.remaining_secs()
    }

    pub fn work_secs(&self) -> u32 {
        self.engine.work_secs()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Completed work phases since the last reset, newest first.
    pub fn recent_sessions(&self) -> Vec<SessionRecord> {
        self.recorder.recent().cloned().collect()
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.engine.is_running() || !self.engine.set_running(true) {
            return None;
        }
        self.guard.activate();
        Some(self.emit(Event::TimerStarted {
            phase: self.engine.phase(),
            remaining_secs: self.engine.remaining_secs(),
            at: Utc::now(),
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.engine.is_running() {
            return None;
        }
        self.engine.set_running(false);
        self.guard.deactivate();
        Some(self.emit(Event::TimerPaused {
            phase: self.engine.phase(),
            remaining_secs: self.engine.remaining_secs(),
            at: Utc::now(),
        }))
    }

    /// Start if paused, pause if running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.engine.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) -> Event {
        self.guard.deactivate();
        self.engine.reset();
        self.recorder.clear();
        self.emit(Event::TimerReset { at: Utc::now() })
    }

    /// Jump to `phase` by hand. Never records a session or dispatches rewards.
    pub fn select_phase(&mut self, phase: SessionPhase) -> Event {
        self.engine.select_phase(phase);
        self.emit(Event::PhaseSelected {
            phase,
            remaining_secs: self.engine.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Set the work length from minute and second fields.
    ///
    /// Fields are clamped to `[0, 90]` and `[0, 59]`. A zero total changes
    /// nothing and returns `None`; otherwise the timer restarts in `Work`.
    pub fn set_custom_duration(&mut self, minutes: i64, seconds: i64) -> Option<Event> {
        let total = clamp_custom_duration(minutes, seconds);
        if !self.engine.set_work_secs(total) {
            return None;
        }
        Some(self.emit(Event::DurationChanged {
            work_secs: total,
            at: Utc::now(),
        }))
    }

    /// [`set_custom_duration`](Self::set_custom_duration) from raw text fields.
    pub fn set_custom_duration_input(&mut self, minutes: &str, seconds: &str) -> Option<Event> {
        self.set_custom_duration(parse_duration_field(minutes), parse_duration_field(seconds))
    }

    /// Advance the countdown by one second.
    ///
    /// On the tick that empties a work phase this records the session and
    /// dispatches rewards before the next phase is entered.
    pub fn tick(&mut self) -> Vec<Event> {
        self.reap();
        let Some(depleted) = self.engine.tick() else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);
        if depleted.phase == SessionPhase::Work {
            let completed_at = Utc::now();
            let record = self.recorder.record_completion(
                round_minutes(depleted.duration_secs),
                completed_at,
                &mut self.tasks,
            );
            self.dispatcher.dispatch(depleted.cycle_index, &mut self.tasks);
            tracing::info!(
                session_id = %record.id,
                minutes = record.duration_minutes,
                cycle_index = depleted.cycle_index,
                "work phase completed"
            );
            events.push(self.emit(Event::WorkCompleted {
                record,
                cycle_index: depleted.cycle_index,
                at: completed_at,
            }));
        }

        if let Some(transition) = self.engine.advance() {
            if self.auto_advance {
                self.engine.set_running(true);
            } else {
                self.guard.deactivate();
            }
            events.push(self.emit(Event::PhaseEntered {
                from: transition.from,
                phase: transition.to,
                cycle_index: transition.cycle_index,
                remaining_secs: transition.remaining_secs,
                running: self.engine.is_running(),
                at: Utc::now(),
            }));
        }
        events
    }

    /// Wait for every outstanding external call to finish.
    ///
    /// Dropping the session instead cancels whatever is still in flight.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "external call task failed");
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "external call task failed");
            }
        }
    }

    fn emit(&self, event: Event) -> Event {
        if let Some(tx) = &self.events {
            // No receivers is fine.
            let _ = tx.send(event.clone());
        }
        event
    }
}
