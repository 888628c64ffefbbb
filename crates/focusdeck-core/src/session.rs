//! Completed-session records and the recorder that produces them.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::ports::SessionHistoryStore;

/// How many completed sessions the recorder keeps in memory.
pub const RECENT_SESSIONS_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Work,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Work => "work",
        }
    }
}

/// One finished work phase. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub duration_minutes: u32,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn work(duration_minutes: u32, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: SessionKind::Work,
            duration_minutes,
            completed_at,
        }
    }
}

/// Builds a record per completed work phase, keeps the latest ones, and
/// hands each to the history store without waiting for it.
pub struct SessionRecorder {
    store: Arc<dyn SessionHistoryStore>,
    recent: VecDeque<SessionRecord>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionHistoryStore>) -> Self {
        Self {
            store,
            recent: VecDeque::with_capacity(RECENT_SESSIONS_CAP),
        }
    }

    /// Record a completion. The in-memory list is updated before this
    /// returns; persistence runs on `tasks` and only logs on failure.
    pub fn record_completion(
        &mut self,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
        tasks: &mut JoinSet<()>,
    ) -> SessionRecord {
        let record = SessionRecord::work(duration_minutes, completed_at);

        self.recent.push_front(record.clone());
        self.recent.truncate(RECENT_SESSIONS_CAP);

        let store = Arc::clone(&self.store);
        let persisted = record.clone();
        tasks.spawn(async move {
            if let Err(e) = store.append_session(&persisted).await {
                tracing::warn!(session_id = %persisted.id, error = %e, "failed to persist session");
            }
        });

        record
    }

    /// Most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &SessionRecord> {
        self.recent.iter()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalError;
    use crate::ports::ExternalResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecStore {
        saved: Mutex<Vec<SessionRecord>>,
    }

    #[async_trait]
    impl SessionHistoryStore for VecStore {
        async fn append_session(&self, record: &SessionRecord) -> ExternalResult {
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct DownStore;

    #[async_trait]
    impl SessionHistoryStore for DownStore {
        async fn append_session(&self, _record: &SessionRecord) -> ExternalResult {
            Err(ExternalError::unavailable("history", "offline"))
        }
    }

    #[tokio::test]
    async fn keeps_ten_newest_first() {
        let store = Arc::new(VecStore::default());
        let mut recorder = SessionRecorder::new(store.clone());
        let mut tasks = JoinSet::new();
        for minutes in 1..=12 {
            recorder.record_completion(minutes, Utc::now(), &mut tasks);
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(recorder.len(), RECENT_SESSIONS_CAP);
        let minutes: Vec<u32> = recorder.recent().map(|r| r.duration_minutes).collect();
        assert_eq!(minutes, (3..=12).rev().collect::<Vec<_>>());
        assert_eq!(store.saved.lock().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn store_failure_keeps_memory_copy() {
        let mut recorder = SessionRecorder::new(Arc::new(DownStore));
        let mut tasks = JoinSet::new();
        let record = recorder.record_completion(25, Utc::now(), &mut tasks);
        while let Some(joined) = tasks.join_next().await {
            assert!(joined.is_ok());
        }
        assert_eq!(recorder.recent().next(), Some(&record));
    }

    #[test]
    fn ids_are_unique() {
        let a = SessionRecord::work(25, Utc::now());
        let b = SessionRecord::work(25, Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn record_serializes_with_type_field() {
        let record = SessionRecord::work(25, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "work");
        assert_eq!(json["durationMinutes"], 25);
        assert!(json.get("completedAt").is_some());
    }
}
