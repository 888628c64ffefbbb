//! A focus session driven by the real clock.
//!
//! All mutation goes through one `tokio::sync::Mutex`, so the clock driver's
//! decrement, automatic transitions and user commands are serialized. The
//! driver is stopped while the lock is held, and every tick re-checks the
//! running flag under the same lock, so a paused session never moves.
//!
//! Whether a clock task is live is tracked by a flag that is only read or
//! written with the session lock held. A tick that ends the countdown clears
//! it before releasing the lock, so a `start` that follows right away always
//! sees it cleared, even while the old task is still winding down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::control::FocusSession;
use crate::events::Event;
use crate::timer::{ClockDriver, SessionPhase, TickControl};

pub struct LiveSession {
    session: Arc<Mutex<FocusSession>>,
    ticking: Arc<AtomicBool>,
    driver: ClockDriver,
}

impl LiveSession {
    pub fn new(session: FocusSession) -> Self {
        Self::with_period(session, Duration::from_secs(1))
    }

    /// Tick every `period` instead of every second.
    pub fn with_period(session: FocusSession, period: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            ticking: Arc::new(AtomicBool::new(false)),
            driver: ClockDriver::with_period(period),
        }
    }

    /// Shared handle for read access (snapshots, recent sessions).
    pub fn session(&self) -> Arc<Mutex<FocusSession>> {
        Arc::clone(&self.session)
    }

    /// Whether a clock task is driving the countdown.
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self) -> Event {
        self.session.lock().await.snapshot()
    }

    pub async fn start(&mut self) -> Option<Event> {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.start();
        self.sync_driver(&session);
        event
    }

    pub async fn pause(&mut self) -> Option<Event> {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.pause();
        self.sync_driver(&session);
        event
    }

    pub async fn toggle(&mut self) -> Option<Event> {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.toggle();
        self.sync_driver(&session);
        event
    }

    pub async fn reset(&mut self) -> Event {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.reset();
        self.sync_driver(&session);
        event
    }

    pub async fn select_phase(&mut self, phase: SessionPhase) -> Event {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.select_phase(phase);
        self.sync_driver(&session);
        event
    }

    pub async fn set_custom_duration(&mut self, minutes: i64, seconds: i64) -> Option<Event> {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.set_custom_duration(minutes, seconds);
        self.sync_driver(&session);
        event
    }

    pub async fn set_custom_duration_input(&mut self, minutes: &str, seconds: &str) -> Option<Event> {
        let shared = Arc::clone(&self.session);
        let mut session = shared.lock().await;
        let event = session.set_custom_duration_input(minutes, seconds);
        self.sync_driver(&session);
        event
    }

    /// Stop ticking, pause, and wait for in-flight external calls.
    pub async fn shutdown(&mut self) {
        let mut session = self.session.lock().await;
        self.driver.stop();
        self.ticking.store(false, Ordering::Relaxed);
        session.pause();
        session.settle().await;
    }

    /// Run the driver exactly when the session is running. Call with the
    /// session lock held.
    fn sync_driver(&mut self, session: &FocusSession) {
        if !session.is_running() {
            self.driver.stop();
            self.ticking.store(false, Ordering::Relaxed);
            return;
        }
        if self.ticking.load(Ordering::Relaxed) {
            return;
        }
        // The previous task may have returned `Stop` without finishing yet.
        self.driver.stop();
        self.ticking.store(true, Ordering::Relaxed);

        let shared = Arc::clone(&self.session);
        let ticking = Arc::clone(&self.ticking);
        self.driver.start(move || {
            let shared = Arc::clone(&shared);
            let ticking = Arc::clone(&ticking);
            async move {
                let mut session = shared.lock().await;
                if session.is_running() {
                    session.tick();
                }
                if session.is_running() {
                    TickControl::Continue
                } else {
                    ticking.store(false, Ordering::Relaxed);
                    TickControl::Stop
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryLedger;
    use crate::storage::Database;
    use crate::timer::{SHORT_BREAK_SECS, WORK_SECS};
    use tokio::sync::broadcast;
    use tokio::time::Instant;

    fn live() -> LiveSession {
        let ledger = Arc::new(MemoryLedger::new());
        let db = Arc::new(Database::open_memory().unwrap());
        LiveSession::new(FocusSession::new(ledger, db))
    }

    async fn elapse(secs: u64) {
        for _ in 0..secs {
            tokio::time::advance(Duration::from_secs(1)).await;
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_while_running() {
        let mut live = live();
        live.start().await;
        elapse(5).await;
        assert_eq!(live.session().lock().await.remaining_secs(), WORK_SECS - 5);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_countdown() {
        let mut live = live();
        live.start().await;
        elapse(3).await;
        live.pause().await;
        assert!(!live.is_ticking());
        let frozen = live.session().lock().await.remaining_secs();
        elapse(10).await;
        assert_eq!(live.session().lock().await.remaining_secs(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_stops_after_depletion() {
        let mut live = live();
        live.set_custom_duration(0, 2).await;
        live.start().await;
        elapse(4).await;
        let session = live.session();
        let session = session.lock().await;
        assert_eq!(session.phase(), SessionPhase::ShortBreak);
        assert!(!session.is_running());
        drop(session);
        assert!(!live.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_driver() {
        let mut live = live();
        live.start().await;
        elapse(2).await;
        live.reset().await;
        assert!(!live.is_ticking());
        elapse(3).await;
        assert_eq!(live.session().lock().await.remaining_secs(), WORK_SECS);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_depletion_keeps_ticking() {
        let mut live = live();
        live.set_custom_duration(0, 2).await;
        live.start().await;
        elapse(3).await;
        assert!(!live.is_ticking());

        assert!(live.start().await.is_some());
        assert!(live.is_ticking());
        elapse(5).await;
        let session = live.session();
        let session = session.lock().await;
        assert_eq!(session.phase(), SessionPhase::ShortBreak);
        assert_eq!(session.remaining_secs(), SHORT_BREAK_SECS - 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn restart_right_after_transition_keeps_ticking() {
        let ledger = Arc::new(MemoryLedger::new());
        let db = Arc::new(Database::open_memory().unwrap());
        let (tx, mut rx) = broadcast::channel(256);
        let session = FocusSession::new(ledger, db).with_events(tx);
        let mut live = LiveSession::with_period(session, Duration::from_micros(200));

        for round in 0..500 {
            live.set_custom_duration(0, 1).await;
            live.start().await;
            // Restart as soon as the tick that ended the work phase lets go of the lock.
            loop {
                match rx.recv().await {
                    Ok(Event::PhaseEntered { .. }) => break,
                    Ok(_) => {}
                    Err(e) => panic!("event stream broke in round {round}: {e}"),
                }
            }
            assert!(live.start().await.is_some());

            let deadline = Instant::now() + Duration::from_secs(2);
            loop {
                let remaining = live.session().lock().await.remaining_secs();
                if remaining < SHORT_BREAK_SECS {
                    break;
                }
                assert!(Instant::now() < deadline, "countdown stalled in round {round}");
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            live.reset().await;
        }
        live.shutdown().await;
    }
}
