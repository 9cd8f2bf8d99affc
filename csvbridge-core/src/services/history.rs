//! Run history - one row per deduplication run in history.duckdb
//!
//! Only counts, the date window and error text are stored. External ids,
//! descriptions and amounts never leave the run.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DateWindow;
use crate::services::dedup::DedupReport;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dedup_runs (
    id VARCHAR PRIMARY KEY,
    timestamp BIGINT NOT NULL,
    gateway VARCHAR NOT NULL,
    window_start VARCHAR,
    window_end VARCHAR,
    lines_in BIGINT NOT NULL,
    lines_out BIGINT NOT NULL,
    remote_transactions BIGINT NOT NULL,
    removed_transactions BIGINT NOT NULL,
    error_message VARCHAR
);
"#;

/// A run as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    /// Unix milliseconds
    pub timestamp: i64,
    pub gateway: String,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub lines_in: i64,
    pub lines_out: i64,
    pub remote_transactions: i64,
    pub removed_transactions: i64,
    pub error_message: Option<String>,
}

impl RunRecord {
    fn base(gateway: &str, lines_in: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            gateway: gateway.to_string(),
            window_start: None,
            window_end: None,
            lines_in: lines_in as i64,
            lines_out: 0,
            remote_transactions: 0,
            removed_transactions: 0,
            error_message: None,
        }
    }

    /// Record for a finished run
    pub fn completed(gateway: &str, report: &DedupReport) -> Self {
        Self {
            window_start: Some(report.window.start_str()),
            window_end: Some(report.window.end_str()),
            lines_out: report.lines_out as i64,
            remote_transactions: report.remote_transactions as i64,
            removed_transactions: report.removed_transactions as i64,
            ..Self::base(gateway, report.lines_in)
        }
    }

    /// Record for a run that aborted
    pub fn failed(
        gateway: &str,
        lines_in: usize,
        window: Option<DateWindow>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            window_start: window.map(|w| w.start_str()),
            window_end: window.map(|w| w.end_str()),
            error_message: Some(message.into()),
            ..Self::base(gateway, lines_in)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

/// Persistent log of deduplication runs
pub struct RunHistory {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl RunHistory {
    /// Open or create history.duckdb in the csvbridge directory
    pub fn open(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("history.duckdb");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Store one run
    pub fn record(&self, run: &RunRecord) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO dedup_runs (
                id, timestamp, gateway, window_start, window_end,
                lines_in, lines_out, remote_transactions, removed_transactions, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                &run.id,
                run.timestamp,
                &run.gateway,
                &run.window_start,
                &run.window_end,
                run.lines_in,
                run.lines_out,
                run.remote_transactions,
                run.removed_transactions,
                &run.error_message,
            ],
        )?;

        Ok(())
    }

    /// Most recent runs first
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        self.select("", limit)
    }

    /// Most recent failed runs first
    pub fn errors(&self, limit: usize) -> Result<Vec<RunRecord>> {
        self.select("WHERE error_message IS NOT NULL", limit)
    }

    fn select(&self, filter: &str, limit: usize) -> Result<Vec<RunRecord>> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;

        let sql = format!(
            r#"
            SELECT id, timestamp, gateway, window_start, window_end,
                   lines_in, lines_out, remote_transactions, removed_transactions, error_message
            FROM dedup_runs
            {}
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
            filter
        );
        let mut stmt = conn.prepare(&sql)?;

        let runs = stmt
            .query_map([limit as i64], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    gateway: row.get(2)?,
                    window_start: row.get(3)?,
                    window_end: row.get(4)?,
                    lines_in: row.get(5)?,
                    lines_out: row.get(6)?,
                    remote_transactions: row.get(7)?,
                    removed_transactions: row.get(8)?,
                    error_message: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    /// Total number of stored runs
    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dedup_runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete runs older than the given unix ms timestamp
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let deleted = conn.execute("DELETE FROM dedup_runs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
