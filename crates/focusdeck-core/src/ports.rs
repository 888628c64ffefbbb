//! Interfaces to the services a focus session talks to.
//!
//! The session only ever calls these; it never inspects their state.
//! Implementations live in [`crate::storage`], [`crate::progress`] and
//! [`crate::blocker`].

use async_trait::async_trait;

use crate::error::ExternalError;
use crate::session::SessionRecord;

/// Outcome of a single collaborator call.
pub type ExternalResult = Result<(), ExternalError>;

/// Points and achievements for the current user.
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    async fn add_points(&self, amount: i64, reason: &str) -> ExternalResult;

    /// Must be idempotent per achievement id: unlocking an owned
    /// achievement again succeeds without changing anything.
    async fn unlock_achievement(&self, id: &str) -> ExternalResult;
}

/// Durable history of completed work phases.
#[async_trait]
pub trait SessionHistoryStore: Send + Sync {
    async fn append_session(&self, record: &SessionRecord) -> ExternalResult;
}

/// Distraction blocker switched on while the countdown runs.
pub trait FocusGuard: Send + Sync {
    fn activate(&self);
    fn deactivate(&self);
}

/// Guard that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGuard;

impl FocusGuard for NoopGuard {
    fn activate(&self) {}
    fn deactivate(&self) {}
}
