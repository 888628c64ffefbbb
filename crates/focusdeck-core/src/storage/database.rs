//! SQLite-based session history and progress ledger.
//!
//! Provides persistent storage for:
//! - Completed work sessions
//! - Point balance, point log and unlocked badges
//! - Key-value store for application state

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, ExternalError, Result};
use crate::ports::{ExternalResult, ProgressLedger, SessionHistoryStore};
use crate::progress::{Badge, PointEntry, Progress, Redemption, ShopBadge, BADGE_BONUS_POINTS};
use crate::session::{SessionKind, SessionRecord};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// SQLite database for sessions and progress.
///
/// The connection sits behind a mutex so one handle can be shared between
/// the history store, the ledger and the focus blocker. Clones share the
/// same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    badge_bonus: i64,
}

impl Database {
    /// Open the database at `~/.config/focusdeck/focusdeck.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusdeck.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            badge_bonus: BADGE_BONUS_POINTS,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Points credited on a badge's first unlock.
    pub fn with_badge_bonus(mut self, badge_bonus: i64) -> Self {
        self.badge_bonus = badge_bonus;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Database(DatabaseError::Poisoned))
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id           TEXT PRIMARY KEY,
                kind         TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS progress (
                id     INTEGER PRIMARY KEY CHECK (id = 1),
                points INTEGER NOT NULL DEFAULT 0
            );
            INSERT OR IGNORE INTO progress (id, points) VALUES (1, 0);

            CREATE TABLE IF NOT EXISTS point_log (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                amount INTEGER NOT NULL,
                reason TEXT NOT NULL DEFAULT '',
                at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS badges (
                id          TEXT PRIMARY KEY,
                unlocked_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Record a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including a duplicate id).
    pub fn record_session(&self, record: &SessionRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO sessions (id, kind, duration_min, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.kind.as_str(),
                record.duration_minutes,
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, duration_min, completed_at
             FROM sessions
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                kind: SessionKind::Work,
                duration_minutes: row.get(1)?,
                completed_at: parse_timestamp(row.get::<_, String>(2)?, 2)?,
            })
        })?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    pub fn stats_today(&self) -> Result<Stats> {
        let (count, minutes) = self.focus_totals_since(Some(start_of_today()))?;
        Ok(Stats {
            total_sessions: count,
            total_focus_min: minutes,
            today_sessions: count,
            today_focus_min: minutes,
        })
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let (total_sessions, total_focus_min) = self.focus_totals_since(None)?;
        let (today_sessions, today_focus_min) = self.focus_totals_since(Some(start_of_today()))?;
        Ok(Stats {
            total_sessions,
            total_focus_min,
            today_sessions,
            today_focus_min,
        })
    }

    fn focus_totals_since(&self, since: Option<String>) -> Result<(u64, u64)> {
        let conn = self.conn()?;
        let since = since.unwrap_or_default();
        let row = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM sessions
             WHERE kind = 'work' AND completed_at >= ?1",
            params![since],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        Ok(row)
    }

    // ── Progress ─────────────────────────────────────────────────────

    pub fn progress(&self) -> Result<Progress> {
        let conn = self.conn()?;
        let points = conn.query_row("SELECT points FROM progress WHERE id = 1", [], |row| {
            row.get::<_, i64>(0)
        })?;
        let mut stmt = conn.prepare("SELECT id, unlocked_at FROM badges ORDER BY unlocked_at")?;
        let rows = stmt.query_map([], |row| {
            Ok(Badge {
                id: row.get(0)?,
                unlocked_at: parse_timestamp(row.get::<_, String>(1)?, 1)?,
            })
        })?;
        let mut badges = Vec::new();
        for row in rows {
            badges.push(row?);
        }
        Ok(Progress { points, badges })
    }

    /// Credit (or debit) points and log the reason. Returns the new balance.
    pub fn credit_points(&self, amount: i64, reason: &str) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let balance = credit_in(&tx, amount, reason)?;
        tx.commit()?;
        Ok(balance)
    }

    /// Unlock a badge. Returns false if it was already owned.
    pub fn unlock_badge(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO badges (id, unlocked_at) VALUES (?1, ?2)",
            params![id, Utc::now().to_rfc3339()],
        )?;
        if inserted == 1 && self.badge_bonus != 0 {
            credit_in(&tx, self.badge_bonus, &format!("Badge unlocked: {id}"))?;
        }
        tx.commit()?;
        Ok(inserted == 1)
    }

    /// Buy a badge from the shop.
    ///
    /// Owned badges and short balances are refused without touching the
    /// ledger. Otherwise the cost is debited and the badge inserted in one
    /// transaction; bought badges earn no unlock bonus.
    pub fn redeem_badge(&self, badge: &ShopBadge) -> Result<Redemption> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let owned: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM badges WHERE id = ?1)",
            params![badge.id],
            |row| row.get(0),
        )?;
        if owned {
            return Ok(Redemption::AlreadyOwned);
        }
        let have: i64 =
            tx.query_row("SELECT points FROM progress WHERE id = 1", [], |row| row.get(0))?;
        if have < badge.cost {
            return Ok(Redemption::NotEnoughPoints {
                need: badge.cost,
                have,
            });
        }
        let balance = credit_in(&tx, -badge.cost, &format!("Redeemed {}", badge.name))?;
        tx.execute(
            "INSERT INTO badges (id, unlocked_at) VALUES (?1, ?2)",
            params![badge.id, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::info!(badge = badge.id, cost = badge.cost, balance, "badge redeemed");
        Ok(Redemption::Redeemed { balance })
    }

    /// Point log, newest first.
    pub fn point_log(&self, limit: usize) -> Result<Vec<PointEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT amount, reason, at FROM point_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(PointEntry {
                amount: row.get(0)?,
                reason: row.get(1)?,
                at: parse_timestamp(row.get::<_, String>(2)?, 2)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn credit_in(conn: &Connection, amount: i64, reason: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "UPDATE progress SET points = points + ?1 WHERE id = 1",
        params![amount],
    )?;
    conn.execute(
        "INSERT INTO point_log (amount, reason, at) VALUES (?1, ?2, ?3)",
        params![amount, reason, Utc::now().to_rfc3339()],
    )?;
    conn.query_row("SELECT points FROM progress WHERE id = 1", [], |row| row.get(0))
}

fn start_of_today() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

fn parse_timestamp(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl Database {
    /// Run `work` on the blocking pool against a clone of this handle.
    async fn blocking<T, F>(&self, service: &'static str, work: F) -> std::result::Result<T, ExternalError>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || work(&db))
            .await
            .map_err(|e| ExternalError::unavailable(service, e))?
            .map_err(|e| ExternalError::unavailable(service, e))
    }
}

#[async_trait]
impl SessionHistoryStore for Database {
    async fn append_session(&self, record: &SessionRecord) -> ExternalResult {
        let record = record.clone();
        self.blocking("session-history", move |db| db.record_session(&record))
            .await
    }
}

#[async_trait]
impl ProgressLedger for Database {
    async fn add_points(&self, amount: i64, reason: &str) -> ExternalResult {
        let owned = reason.to_string();
        let balance = self
            .blocking("progress-ledger", move |db| db.credit_points(amount, &owned))
            .await?;
        tracing::info!(amount, reason, balance, "points credited");
        Ok(())
    }

    async fn unlock_achievement(&self, id: &str) -> ExternalResult {
        let owned = id.to_string();
        let unlocked = self
            .blocking("progress-ledger", move |db| db.unlock_badge(&owned))
            .await?;
        if unlocked {
            tracing::info!(badge = id, "achievement unlocked");
        }
        Ok(())
    }
}
