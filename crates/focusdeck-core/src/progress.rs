//! Points, badges and ranks.
//!
//! [`MemoryLedger`] is the in-process [`ProgressLedger`]; the SQLite-backed
//! one is [`crate::storage::Database`]. Both credit a one-time bonus when a
//! badge is first unlocked and treat repeat unlocks as a no-op.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExternalError;
use crate::ports::{ExternalResult, ProgressLedger};

/// Bonus credited the first time any badge is unlocked.
pub const BADGE_BONUS_POINTS: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub unlocked_at: DateTime<Utc>,
}

/// One credit or debit applied to the point balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEntry {
    pub amount: i64,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub points: i64,
    pub badges: Vec<Badge>,
}

impl Progress {
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b.id == id)
    }

    pub fn rank(&self) -> Rank {
        Rank::for_points(self.points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Rank {
    pub fn for_points(points: i64) -> Self {
        match points {
            p if p < 100 => Rank::Bronze,
            p if p < 500 => Rank::Silver,
            p if p < 1000 => Rank::Gold,
            _ => Rank::Platinum,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
        }
    }
}

/// A badge that can be bought with points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopBadge {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: i64,
}

pub static BADGE_SHOP: [ShopBadge; 3] = [
    ShopBadge {
        id: "starter",
        name: "Starter",
        cost: 50,
    },
    ShopBadge {
        id: "focus-master",
        name: "Focus Master",
        cost: 100,
    },
    ShopBadge {
        id: "streak-king",
        name: "Streak King",
        cost: 200,
    },
];

pub fn shop_badge(id: &str) -> Option<&'static ShopBadge> {
    BADGE_SHOP.iter().find(|b| b.id == id)
}

/// Outcome of trying to buy a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Redemption {
    Redeemed { balance: i64 },
    AlreadyOwned,
    NotEnoughPoints { need: i64, have: i64 },
}

#[derive(Debug, Default)]
struct LedgerState {
    progress: Progress,
    history: Vec<PointEntry>,
}

/// Ledger kept in process memory for the lifetime of the app.
#[derive(Debug)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    badge_bonus: i64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_badge_bonus(BADGE_BONUS_POINTS)
    }

    pub fn with_badge_bonus(badge_bonus: i64) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            badge_bonus,
        }
    }

    pub fn progress(&self) -> Progress {
        self.state
            .lock()
            .map(|s| s.progress.clone())
            .unwrap_or_default()
    }

    /// Every balance change, oldest first.
    pub fn history(&self) -> Vec<PointEntry> {
        self.state
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, ExternalError> {
        self.state
            .lock()
            .map_err(|_| ExternalError::unavailable("memory-ledger", "state poisoned"))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn credit(state: &mut LedgerState, amount: i64, reason: &str) {
    state.progress.points += amount;
    state.history.push(PointEntry {
        amount,
        reason: reason.to_string(),
        at: Utc::now(),
    });
    tracing::info!(amount, reason, total = state.progress.points, "points credited");
}

#[async_trait]
impl ProgressLedger for MemoryLedger {
    async fn add_points(&self, amount: i64, reason: &str) -> ExternalResult {
        let mut state = self.lock()?;
        credit(&mut state, amount, reason);
        Ok(())
    }

    async fn unlock_achievement(&self, id: &str) -> ExternalResult {
        let mut state = self.lock()?;
        if state.progress.has_badge(id) {
            return Ok(());
        }
        state.progress.badges.push(Badge {
            id: id.to_string(),
            unlocked_at: Utc::now(),
        });
        if self.badge_bonus != 0 {
            credit(&mut state, self.badge_bonus, &format!("Badge unlocked: {id}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::for_points(0), Rank::Bronze);
        assert_eq!(Rank::for_points(99), Rank::Bronze);
        assert_eq!(Rank::for_points(100), Rank::Silver);
        assert_eq!(Rank::for_points(499), Rank::Silver);
        assert_eq!(Rank::for_points(500), Rank::Gold);
        assert_eq!(Rank::for_points(1000), Rank::Platinum);
        assert_eq!(Rank::for_points(-20), Rank::Bronze);
    }

    #[test]
    fn shop_lookup() {
        assert_eq!(shop_badge("focus-master").map(|b| b.cost), Some(100));
        assert!(shop_badge("pomodoro-marathon").is_none());
    }

    #[tokio::test]
    async fn add_points_accumulates() {
        let ledger = MemoryLedger::new();
        ledger.add_points(10, "Pomodoro complete").await.unwrap();
        ledger.add_points(-4, "Redeemed").await.unwrap();
        assert_eq!(ledger.progress().points, 6);
        assert_eq!(ledger.history().len(), 2);
    }

    #[tokio::test]
    async fn unlock_is_idempotent() {
        let ledger = MemoryLedger::new();
        ledger.unlock_achievement("pomodoro-marathon").await.unwrap();
        let once = ledger.progress();
        ledger.unlock_achievement("pomodoro-marathon").await.unwrap();
        assert_eq!(ledger.progress(), once);
        assert_eq!(once.points, BADGE_BONUS_POINTS);
        assert_eq!(once.badges.len(), 1);
    }

    #[tokio::test]
    async fn zero_bonus_skips_credit_entry() {
        let ledger = MemoryLedger::with_badge_bonus(0);
        ledger.unlock_achievement("starter").await.unwrap();
        assert!(ledger.history().is_empty());
        assert!(ledger.progress().has_badge("starter"));
    }
}
