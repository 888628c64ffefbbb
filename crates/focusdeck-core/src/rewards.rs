//! Point credit and achievement unlocks for completed work phases.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::ports::ProgressLedger;
use crate::timer::CYCLES_FOR_LONG;

/// Points credited per completed work phase.
pub const POMODORO_POINTS: i64 = 10;
/// Reason attached to the per-phase credit.
pub const POMODORO_REASON: &str = "Pomodoro complete";
/// Achievement unlocked on every fourth work phase of a cycle.
pub const MARATHON_BADGE: &str = "pomodoro-marathon";

/// What a single dispatch asked the ledger for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub points: i64,
    pub unlocked_marathon: bool,
}

pub struct RewardDispatcher {
    ledger: Arc<dyn ProgressLedger>,
    points: i64,
}

impl RewardDispatcher {
    pub fn new(ledger: Arc<dyn ProgressLedger>) -> Self {
        Self::with_points(ledger, POMODORO_POINTS)
    }

    pub fn with_points(ledger: Arc<dyn ProgressLedger>, points: i64) -> Self {
        Self { ledger, points }
    }

    /// Request rewards for the work phase that completed as `cycle_index`.
    ///
    /// The credit and the unlock run as separate tasks so neither can hold
    /// up or fail the other. Failures are logged.
    pub fn dispatch(&self, cycle_index: u32, tasks: &mut JoinSet<()>) -> Dispatched {
        let ledger = Arc::clone(&self.ledger);
        let points = self.points;
        tasks.spawn(async move {
            if let Err(e) = ledger.add_points(points, POMODORO_REASON).await {
                tracing::warn!(points, error = %e, "failed to credit pomodoro points");
            }
        });

        let unlocked_marathon = cycle_index > 0 && cycle_index % CYCLES_FOR_LONG == 0;
        if unlocked_marathon {
            let ledger = Arc::clone(&self.ledger);
            tasks.spawn(async move {
                if let Err(e) = ledger.unlock_achievement(MARATHON_BADGE).await {
                    tracing::warn!(badge = MARATHON_BADGE, error = %e, "failed to unlock achievement");
                }
            });
        }

        Dispatched {
            points,
            unlocked_marathon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalError;
    use crate::ports::ExternalResult;
    use crate::progress::MemoryLedger;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn drain(tasks: &mut JoinSet<()>) {
        while tasks.join_next().await.is_some() {}
    }

    #[tokio::test]
    async fn credits_every_completion() {
        let ledger = Arc::new(MemoryLedger::new());
        let dispatcher = RewardDispatcher::new(ledger.clone());
        let mut tasks = JoinSet::new();
        for cycle in 1..=3 {
            let d = dispatcher.dispatch(cycle, &mut tasks);
            assert!(!d.unlocked_marathon);
        }
        drain(&mut tasks).await;
        assert_eq!(ledger.progress().points, 30);
        assert!(ledger.progress().badges.is_empty());
    }

    #[tokio::test]
    async fn fourth_cycle_unlocks_marathon() {
        let ledger = Arc::new(MemoryLedger::new());
        let dispatcher = RewardDispatcher::new(ledger.clone());
        let mut tasks = JoinSet::new();
        assert!(dispatcher.dispatch(4, &mut tasks).unlocked_marathon);
        drain(&mut tasks).await;
        assert!(ledger.progress().has_badge(MARATHON_BADGE));
    }

    struct FailingPoints {
        unlocks: AtomicUsize,
    }

    #[async_trait]
    impl ProgressLedger for FailingPoints {
        async fn add_points(&self, _amount: i64, _reason: &str) -> ExternalResult {
            Err(ExternalError::unavailable("ledger", "timeout"))
        }

        async fn unlock_achievement(&self, _id: &str) -> ExternalResult {
            self.unlocks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_credit_does_not_block_unlock() {
        let ledger = Arc::new(FailingPoints {
            unlocks: AtomicUsize::new(0),
        });
        let dispatcher = RewardDispatcher::new(ledger.clone());
        let mut tasks = JoinSet::new();
        dispatcher.dispatch(8, &mut tasks);
        while let Some(joined) = tasks.join_next().await {
            assert!(joined.is_ok());
        }
        assert_eq!(ledger.unlocks.load(Ordering::SeqCst), 1);
    }
}
