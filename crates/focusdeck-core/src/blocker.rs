//! Focus blocker.
//!
//! Tracks whether distraction blocking is on, since when, and how long the
//! last block lasted. Enforcement (hosts file, browser extension, overlay) is
//! up to whatever reads [`BlockerState`]; the state is mirrored into the
//! database kv store under [`BLOCKER_KEY`] when a database is attached.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::FocusGuard;
use crate::storage::Database;

pub const BLOCKER_KEY: &str = "focus_blocker";

pub fn default_blocked_sites() -> Vec<String> {
    ["twitter.com", "instagram.com", "facebook.com", "youtube.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerState {
    pub active: bool,
    pub blocked_since: Option<DateTime<Utc>>,
    pub blocked_until: Option<DateTime<Utc>>,
    /// Length of the most recent block, in minutes with one decimal.
    pub last_block_minutes: Option<f64>,
    pub blocked_sites: Vec<String>,
}

impl Default for BlockerState {
    fn default() -> Self {
        Self {
            active: false,
            blocked_since: None,
            blocked_until: None,
            last_block_minutes: None,
            blocked_sites: default_blocked_sites(),
        }
    }
}

pub struct FocusBlocker {
    state: Mutex<BlockerState>,
    db: Option<Arc<Database>>,
    enabled: bool,
}

impl FocusBlocker {
    pub fn new(blocked_sites: Vec<String>) -> Self {
        Self {
            state: Mutex::new(BlockerState {
                blocked_sites,
                ..BlockerState::default()
            }),
            db: None,
            enabled: true,
        }
    }

    /// Restore the last persisted state and keep mirroring changes to `db`.
    ///
    /// A block left active by a previous run is kept as-is; the next
    /// `deactivate` closes it.
    pub fn with_database(db: Arc<Database>, blocked_sites: Vec<String>) -> Self {
        let mut state = match db.kv_get(BLOCKER_KEY) {
            Ok(Some(json)) => serde_json::from_str::<BlockerState>(&json).unwrap_or_default(),
            Ok(None) => BlockerState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read blocker state");
                BlockerState::default()
            }
        };
        state.blocked_sites = blocked_sites;
        Self {
            state: Mutex::new(state),
            db: Some(db),
            enabled: true,
        }
    }

    /// A disabled blocker ignores activate/deactivate.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn state(&self) -> BlockerState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().map(|s| s.active).unwrap_or(false)
    }

    fn update(&self, f: impl FnOnce(&mut BlockerState) -> bool) {
        if !self.enabled {
            return;
        }
        let snapshot = {
            let Ok(mut state) = self.state.lock() else {
                tracing::warn!("blocker state poisoned");
                return;
            };
            if !f(&mut state) {
                return;
            }
            state.clone()
        };
        self.persist(&snapshot);
    }

    fn persist(&self, state: &BlockerState) {
        let Some(db) = &self.db else {
            return;
        };
        let result = serde_json::to_string(state)
            .map_err(crate::error::CoreError::from)
            .and_then(|json| db.kv_set(BLOCKER_KEY, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist blocker state");
        }
    }
}

impl Default for FocusBlocker {
    fn default() -> Self {
        Self::new(default_blocked_sites())
    }
}

impl FocusGuard for FocusBlocker {
    fn activate(&self) {
        self.update(|state| {
            if state.active {
                return false;
            }
            state.active = true;
            state.blocked_since = Some(Utc::now());
            state.blocked_until = None;
            tracing::info!(sites = state.blocked_sites.len(), "focus blocker on");
            true
        });
    }

    fn deactivate(&self) {
        self.update(|state| {
            if !state.active {
                return false;
            }
            let now = Utc::now();
            state.active = false;
            state.blocked_until = Some(now);
            if let Some(since) = state.blocked_since {
                let secs = (now - since).num_milliseconds().max(0) as f64 / 1000.0;
                let minutes = (secs / 60.0 * 10.0).round() / 10.0;
                state.last_block_minutes = Some(minutes);
                tracing::info!(minutes, "focus blocker off");
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_then_deactivate_records_length() {
        let blocker = FocusBlocker::default();
        blocker.activate();
        assert!(blocker.is_active());
        let since = blocker.state().blocked_since;
        assert!(since.is_some());

        // Second activate keeps the original start.
        blocker.activate();
        assert_eq!(blocker.state().blocked_since, since);

        blocker.deactivate();
        let state = blocker.state();
        assert!(!state.active);
        assert!(state.blocked_until.is_some());
        assert_eq!(state.last_block_minutes, Some(0.0));
    }

    #[test]
    fn deactivate_when_idle_is_noop() {
        let blocker = FocusBlocker::default();
        blocker.deactivate();
        assert_eq!(blocker.state(), BlockerState::default());
    }

    #[test]
    fn disabled_blocker_never_activates() {
        let blocker = FocusBlocker::default().enabled(false);
        blocker.activate();
        assert!(!blocker.is_active());
    }

    #[test]
    fn state_round_trips_through_database() {
        let db = Arc::new(Database::open_memory().unwrap());
        let blocker = FocusBlocker::with_database(db.clone(), vec!["news.example".into()]);
        blocker.activate();

        let restored = FocusBlocker::with_database(db, default_blocked_sites());
        let state = restored.state();
        assert!(state.active);
        assert_eq!(state.blocked_sites, default_blocked_sites());
    }
}
