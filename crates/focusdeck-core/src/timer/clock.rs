//! Clock driver.
//!
//! Runs a callback once per period on a tokio task. The callback decides
//! whether to keep going. There is no drift correction: a slow callback
//! delays the next tick instead of causing a burst of catch-up ticks.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Returned by the tick callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

pub struct ClockDriver {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// A driver that ticks once per second.
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    /// Whether a tick task is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start ticking. The first tick fires one full period from now.
    ///
    /// A no-op if the driver is already running. Must be called from within
    /// a tokio runtime.
    pub fn start<F, Fut>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickControl> + Send + 'static,
    {
        if self.is_running() {
            return;
        }
        let period = self.period;
        let first = Instant::now() + period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().await == TickControl::Stop {
                    break;
                }
            }
        }));
    }

    /// Cancel the tick task.
    ///
    /// The task is aborted before this returns, so no tick starts after
    /// that point. A callback already in flight is cut off at its next
    /// await; callers that share state with it should make each tick check
    /// whether it still applies.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Default for ClockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
