// SQLite persistence for locally cached entry drafts.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::snapshot::FormSnapshot;

/// A snapshot persisted for recovery after a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub data: FormSnapshot,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Draft {
    /// Stamp `data` with the current wall-clock time.
    pub fn now(data: FormSnapshot) -> Self {
        Draft {
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether the draft is younger than `window` at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < window_ms
    }
}

/// Storage key for a contest's draft.
pub fn draft_key(contest_id: &str) -> String {
    format!("contest_entry_{contest_id}")
}

/// SQLite-backed key-value store holding one draft per contest.
pub struct DraftStore {
    conn: Mutex<Connection>,
}

impl DraftStore {
    /// Open (or create) the store at `path`. Pass `":memory:"` for an
    /// ephemeral store.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entry_drafts (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned, which only happens after another
    /// thread panicked mid-query.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("draft store mutex poisoned")
    }

    /// Write `draft` for `contest_id`, replacing any previous draft.
    pub fn save_draft(&self, contest_id: &str, draft: &Draft) -> Result<(), StoreError> {
        let json = serde_json::to_string(draft).map_err(StoreError::Encode)?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO entry_drafts (key, value) VALUES (?1, ?2)",
            params![draft_key(contest_id), json],
        )?;
        Ok(())
    }

    /// Load the draft for `contest_id`, if one exists.
    pub fn load_draft(&self, contest_id: &str) -> Result<Option<Draft>, StoreError> {
        let raw: Option<String> = {
            let conn = self.conn();
            conn.query_row(
                "SELECT value FROM entry_drafts WHERE key = ?1",
                params![draft_key(contest_id)],
                |row| row.get(0),
            )
            .optional()?
        };

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    contest_id: contest_id.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Load the draft for `contest_id` only if it is younger than `window`.
    pub fn load_fresh(
        &self,
        contest_id: &str,
        now_ms: i64,
        window: Duration,
    ) -> Result<Option<Draft>, StoreError> {
        Ok(self
            .load_draft(contest_id)?
            .filter(|draft| draft.is_fresh(now_ms, window)))
    }

    /// Remove the draft for `contest_id`. Missing drafts are not an error.
    pub fn clear_draft(&self, contest_id: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM entry_drafts WHERE key = ?1",
            params![draft_key(contest_id)],
        )?;
        Ok(())
    }

    /// Number of drafts currently stored.
    pub fn draft_count(&self) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entry_drafts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Write raw text under a contest's key. Only used to simulate damaged
    /// rows in tests.
    #[doc(hidden)]
    pub fn write_raw(&self, contest_id: &str, raw: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO entry_drafts (key, value) VALUES (?1, ?2)",
            params![draft_key(contest_id), raw],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FieldValue;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn test_store() -> DraftStore {
        DraftStore::open(":memory:").expect("in-memory store should open")
    }

    fn snapshot(answer: &str) -> FormSnapshot {
        [("question_1".to_string(), FieldValue::Single(answer.into()))]
            .into_iter()
            .collect()
    }

    #[test]
    fn open_creates_table() {
        let store = test_store();
        let conn = store.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='entry_drafts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn save_and_load_round_trip() {
        let store = test_store();
        let draft = Draft {
            data: snapshot("True"),
            timestamp: 1_000,
        };
        store.save_draft("5", &draft).unwrap();
        assert_eq!(store.load_draft("5").unwrap(), Some(draft));
    }

    #[test]
    fn load_missing_draft_is_none() {
        let store = test_store();
        assert!(store.load_draft("nope").unwrap().is_none());
    }

    #[test]
    fn newer_draft_supersedes_older() {
        let store = test_store();
        store
            .save_draft("5", &Draft { data: snapshot("True"), timestamp: 1 })
            .unwrap();
        store
            .save_draft("5", &Draft { data: snapshot("False"), timestamp: 2 })
            .unwrap();
        let loaded = store.load_draft("5").unwrap().unwrap();
        assert_eq!(loaded.data, snapshot("False"));
        assert_eq!(store.draft_count().unwrap(), 1);
    }

    #[test]
    fn drafts_are_scoped_by_contest() {
        let store = test_store();
        store
            .save_draft("1", &Draft { data: snapshot("True"), timestamp: 1 })
            .unwrap();
        assert!(store.load_draft("2").unwrap().is_none());
    }

    #[test]
    fn clear_removes_only_that_contest() {
        let store = test_store();
        store
            .save_draft("1", &Draft { data: snapshot("True"), timestamp: 1 })
            .unwrap();
        store
            .save_draft("2", &Draft { data: snapshot("True"), timestamp: 1 })
            .unwrap();
        store.clear_draft("1").unwrap();
        assert!(store.load_draft("1").unwrap().is_none());
        assert!(store.load_draft("2").unwrap().is_some());
        store.clear_draft("missing").unwrap();
    }

    #[test]
    fn stale_draft_is_filtered_by_load_fresh() {
        let store = test_store();
        let now = 10 * DAY.as_millis() as i64;
        let old = now - DAY.as_millis() as i64 - 1;
        store
            .save_draft("1", &Draft { data: snapshot("True"), timestamp: old })
            .unwrap();
        assert!(store.load_fresh("1", now, DAY).unwrap().is_none());

        store
            .save_draft("1", &Draft { data: snapshot("True"), timestamp: now - 1_000 })
            .unwrap();
        assert!(store.load_fresh("1", now, DAY).unwrap().is_some());
    }

    #[test]
    fn draft_exactly_at_window_edge_is_stale() {
        let draft = Draft {
            data: FormSnapshot::default(),
            timestamp: 0,
        };
        assert!(!draft.is_fresh(DAY.as_millis() as i64, DAY));
        assert!(draft.is_fresh(DAY.as_millis() as i64 - 1, DAY));
    }

    #[test]
    fn corrupt_row_reports_corrupt() {
        let store = test_store();
        store.write_raw("1", "{not json").unwrap();
        let err = store.load_draft("1").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref contest_id, .. } if contest_id == "1"));
    }

    #[test]
    fn stored_json_has_data_and_timestamp() {
        let store = test_store();
        store
            .save_draft("3", &Draft { data: snapshot("True"), timestamp: 77 })
            .unwrap();
        let conn = store.conn();
        let raw: String = conn
            .query_row(
                "SELECT value FROM entry_drafts WHERE key = 'contest_entry_3'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["timestamp"], 77);
        assert_eq!(value["data"]["question_1"], "True");
    }
}
