// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail: append-only SQLite log of every signature lifecycle
// transition.
//
// Schema:
//   audit_log(
//     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp  TEXT    NOT NULL,   -- RFC 3339
//     action     TEXT    NOT NULL,   -- "sign", "decline", "expire", "complete"
//     subject    TEXT    NOT NULL,   -- token fingerprint or document id
//     success    INTEGER NOT NULL,   -- 0 = rejected, 1 = applied
//     details    TEXT                -- optional free-form context
//   )
//
// Raw tokens never reach this table; signature entries are keyed by the
// token fingerprint.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use signet_core::error::SignetError;
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS audit_log (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp  TEXT    NOT NULL,
    action     TEXT    NOT NULL,
    subject    TEXT    NOT NULL,
    success    INTEGER NOT NULL,
    details    TEXT
);
CREATE INDEX IF NOT EXISTS audit_log_subject ON audit_log (subject);";

/// Convert a `rusqlite::Error` into a `SignetError::Database`.
fn db_err(e: rusqlite::Error) -> SignetError {
    SignetError::Database(e.to_string())
}

/// Kinds of lifecycle transition that get audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Sign,
    Decline,
    Expire,
    Complete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Decline => "decline",
            Self::Expire => "expire",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the audit log, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub subject: String,
    pub success: bool,
    pub details: Option<String>,
}

/// Append-only audit log backed by a SQLite database.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`.
    ///
    /// WAL mode is enabled so that several request handlers can append while
    /// an operator reads.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SignetError> {
        let conn = Connection::open(path).map_err(db_err)?;

        conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SignetError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Record a new audit entry.
    #[instrument(skip(self, details), fields(%action, %subject, success))]
    pub fn record(
        &self,
        action: AuditAction,
        subject: &str,
        success: bool,
        details: Option<&str>,
    ) -> Result<(), SignetError> {
        let timestamp = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO audit_log (timestamp, action, subject, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![timestamp, action.as_str(), subject, success as i32, details],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries for `subject`, oldest first.
    pub fn entries_for_subject(&self, subject: &str) -> Result<Vec<AuditEntry>, SignetError> {
        self.query(
            "SELECT id, timestamp, action, subject, success, details
             FROM audit_log
             WHERE subject = ?1
             ORDER BY id ASC",
            params![subject],
        )
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, SignetError> {
        self.query(
            "SELECT id, timestamp, action, subject, success, details
             FROM audit_log
             ORDER BY id DESC
             LIMIT ?1",
            params![limit],
        )
    }

    /// Return the total number of entries in the audit log.
    pub fn count(&self) -> Result<u64, SignetError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn query(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<AuditEntry>, SignetError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    action: row.get(2)?,
                    subject: row.get(3)?,
                    success: row.get::<_, i32>(4)? != 0,
                    details: row.get(5)?,
                })
            })
            .map_err(db_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}
