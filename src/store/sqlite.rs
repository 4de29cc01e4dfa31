//! SQLite implementation of [`DealStore`].

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::store::{DealStore, StoreError};
use crate::types::{ActionLogEntry, AiSummary, Deal, DealStage, EmailRecord, StageHistoryEntry};

/// Applied on every open; idempotent.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS deals (
    tenant_id TEXT NOT NULL,
    id TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    stage TEXT NOT NULL DEFAULT 'discovery',
    stage_data TEXT,
    ai_summary TEXT,
    ai_summary_last_updated TEXT,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS action_logs (
    tenant_id TEXT NOT NULL,
    deal_id TEXT NOT NULL,
    id TEXT NOT NULL,
    doc TEXT NOT NULL,
    recorded_at TEXT,
    PRIMARY KEY (tenant_id, deal_id, id)
);
CREATE INDEX IF NOT EXISTS idx_action_logs_deal
    ON action_logs(tenant_id, deal_id, recorded_at);

CREATE TABLE IF NOT EXISTS emails (
    tenant_id TEXT NOT NULL,
    deal_id TEXT NOT NULL,
    id TEXT NOT NULL,
    doc TEXT NOT NULL,
    recorded_at TEXT,
    PRIMARY KEY (tenant_id, deal_id, id)
);
CREATE INDEX IF NOT EXISTS idx_emails_deal
    ON emails(tenant_id, deal_id, recorded_at);

CREATE TABLE IF NOT EXISTS stage_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id TEXT NOT NULL,
    deal_id TEXT NOT NULL,
    doc TEXT NOT NULL,
    recorded_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_stage_history_deal
    ON stage_history(tenant_id, deal_id, recorded_at);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `~/.dealsense/dealsense.db` and
    /// apply the schema.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(Self::db_path()?)
    }

    /// Open a database at an explicit path. Useful for testing and the
    /// CLI's `--db` flag.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Resolve the default database path: `~/.dealsense/dealsense.db`.
    fn db_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
        Ok(home.join(".dealsense").join("dealsense.db"))
    }

    /// Insert or replace a deal document.
    pub fn upsert_deal(&self, tenant_id: &str, deal: &Deal) -> Result<(), StoreError> {
        let stage_data = deal
            .stage_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let ai_summary = deal
            .ai_summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO deals (tenant_id, id, name, stage, stage_data, ai_summary, ai_summary_last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(tenant_id, id) DO UPDATE SET
                name = excluded.name,
                stage = excluded.stage,
                stage_data = excluded.stage_data,
                ai_summary = excluded.ai_summary,
                ai_summary_last_updated = excluded.ai_summary_last_updated",
            params![
                tenant_id,
                deal.id,
                deal.name,
                deal.stage.as_str(),
                stage_data,
                ai_summary,
                deal.ai_summary_last_updated.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Append one action-log entry, stored as its whole JSON document.
    pub fn insert_action_log(
        &self,
        tenant_id: &str,
        deal_id: &str,
        entry: &ActionLogEntry,
    ) -> Result<(), StoreError> {
        let doc = serde_json::to_string(entry)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO action_logs (tenant_id, deal_id, id, doc, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant_id,
                deal_id,
                entry.id,
                doc,
                entry.timestamp.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Append one email record, stored as its whole JSON document.
    pub fn insert_email(
        &self,
        tenant_id: &str,
        deal_id: &str,
        email: &EmailRecord,
    ) -> Result<(), StoreError> {
        let doc = serde_json::to_string(email)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO emails (tenant_id, deal_id, id, doc, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant_id,
                deal_id,
                email.id,
                doc,
                email.timestamp.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Append one stage transition.
    pub fn insert_stage_history(
        &self,
        tenant_id: &str,
        deal_id: &str,
        entry: &StageHistoryEntry,
    ) -> Result<(), StoreError> {
        let doc = serde_json::to_string(entry)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO stage_history (tenant_id, deal_id, doc, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                tenant_id,
                deal_id,
                doc,
                entry.timestamp.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Fetch the newest `limit` documents from one of the activity tables.
    /// Undated rows sort behind dated ones; rows whose JSON no longer parses
    /// are skipped with a warning.
    fn fetch_docs<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<T>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT doc FROM {table}
             WHERE tenant_id = ?1 AND deal_id = ?2
             ORDER BY recorded_at DESC
             LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tenant_id, deal_id, limit as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut items = Vec::new();
        for row in rows {
            let doc = row?;
            match serde_json::from_str(&doc) {
                Ok(item) => items.push(item),
                Err(e) => log::warn!("Skipping malformed {table} row for deal {deal_id}: {e}"),
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl DealStore for SqliteStore {
    async fn get_deal(&self, tenant_id: &str, deal_id: &str) -> Result<Option<Deal>, StoreError> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT id, name, stage, stage_data, ai_summary, ai_summary_last_updated
             FROM deals
             WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, deal_id],
            |row| {
                Ok(DealRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    stage: row.get(2)?,
                    stage_data: row.get(3)?,
                    ai_summary: row.get(4)?,
                    ai_summary_last_updated: row.get(5)?,
                })
            },
        );

        match result {
            Ok(row) => Ok(Some(row.into_deal())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn recent_action_logs(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<ActionLogEntry>, StoreError> {
        self.fetch_docs("action_logs", tenant_id, deal_id, limit)
    }

    async fn recent_emails(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<EmailRecord>, StoreError> {
        self.fetch_docs("emails", tenant_id, deal_id, limit)
    }

    async fn recent_stage_history(
        &self,
        tenant_id: &str,
        deal_id: &str,
        limit: usize,
    ) -> Result<Vec<StageHistoryEntry>, StoreError> {
        self.fetch_docs("stage_history", tenant_id, deal_id, limit)
    }

    async fn save_ai_summary(
        &self,
        tenant_id: &str,
        deal_id: &str,
        summary: &AiSummary,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(summary)?;
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE deals
             SET ai_summary = ?1, ai_summary_last_updated = ?2
             WHERE tenant_id = ?3 AND id = ?4",
            params![
                encoded,
                summary.last_updated.to_rfc3339(),
                tenant_id,
                deal_id,
            ],
        )?;
        if updated == 0 {
            // Deal deleted while the run was in flight; last write wins and
            // there is nothing left to update.
            log::warn!("aiSummary write matched no deal row for {deal_id}");
        }
        Ok(())
    }
}

/// Raw deal columns before JSON normalization.
struct DealRow {
    id: String,
    name: String,
    stage: String,
    stage_data: Option<String>,
    ai_summary: Option<String>,
    ai_summary_last_updated: Option<String>,
}

impl DealRow {
    fn into_deal(self) -> Deal {
        Deal {
            id: self.id,
            name: self.name,
            stage: DealStage::from_str_lossy(&self.stage),
            // JSON blocks parse leniently: malformed state reads as absent.
            stage_data: self
                .stage_data
                .as_deref()
                .and_then(|j| serde_json::from_str(j).ok()),
            ai_summary: self
                .ai_summary
                .as_deref()
                .and_then(|j| serde_json::from_str(j).ok()),
            ai_summary_last_updated: self
                .ai_summary_last_updated
                .as_deref()
                .and_then(parse_instant),
        }
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
