// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence for documents and signatures.
//
// Every status transition is a single conditional UPDATE ("... WHERE status
// = 'PENDING'") and the affected-row count decides who won.  Two requests
// racing on the same token therefore resolve to exactly one winner without
// any locking in the engine itself.
//
// Timestamps are stored as fixed-width RFC 3339 (microseconds, `Z`) so that
// string comparison in SQL orders them correctly.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use signet_core::error::{Result, SignetError};
use signet_core::types::{
    DocumentEntity, DocumentId, DocumentStatus, Provenance, SignatureData, SignatureEntity,
    SignatureId, SignaturePath, SignatureStatus, SignatureToken, Signer,
};

/// SQLite schema for documents and their signatures.
const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        status TEXT NOT NULL,
        expires_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS signatures (
        id TEXT PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        document_id TEXT NOT NULL REFERENCES documents (id),
        signer_name TEXT NOT NULL,
        signer_email TEXT NOT NULL,
        status TEXT NOT NULL,
        signed_at TEXT,
        origin_address TEXT,
        user_agent TEXT,
        path TEXT,
        signature_data TEXT,
        artifact_digest TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS signatures_document ON signatures (document_id);
"#;

const SIGNATURE_COLUMNS: &str = "id, token, document_id, signer_name, signer_email, status,
    signed_at, origin_address, user_agent, path, signature_data, artifact_digest, created_at";

/// Everything written by the PENDING → SIGNED transition.
#[derive(Debug, Clone)]
pub struct SignedArtifact {
    pub signed_at: DateTime<Utc>,
    pub provenance: Provenance,
    pub path: SignaturePath,
    pub data: SignatureData,
    pub digest: String,
}

/// Conditional read/update operations the lifecycle engine needs from a
/// transactional store.
///
/// Every `mark_*` method must be a single atomic "update only if still
/// PENDING" and report whether this call performed the transition.
pub trait SignatureRepository {
    /// Insert a document together with its signatures, all or nothing.
    fn insert_document(&self, document: &DocumentEntity, signatures: &[SignatureEntity]) -> Result<()>;

    fn document(&self, id: &DocumentId) -> Result<Option<DocumentEntity>>;

    fn signature_by_token(&self, token: &SignatureToken) -> Result<Option<SignatureEntity>>;

    /// All signatures of a document in one read, in creation order.
    fn signatures_for_document(&self, id: &DocumentId) -> Result<Vec<SignatureEntity>>;

    /// Pending signatures whose document expired before `now`.
    fn overdue_pending(&self, now: DateTime<Utc>) -> Result<Vec<SignatureEntity>>;

    fn mark_expired(&self, token: &SignatureToken) -> Result<bool>;

    fn mark_declined(&self, token: &SignatureToken) -> Result<bool>;

    fn mark_signed(&self, token: &SignatureToken, artifact: &SignedArtifact) -> Result<bool>;

    /// Move a SENT document to COMPLETED, but only if it has at least one
    /// signature and every one of them is SIGNED.
    fn complete_document(&self, id: &DocumentId, at: DateTime<Utc>) -> Result<bool>;
}

/// Signature and document store backed by SQLite.
///
/// `Connection` is `Send` but not `Sync`; give each worker its own store on
/// the same database file rather than sharing one behind a lock.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Sets the busy timeout before anything else so that concurrent openers
    /// wait instead of failing, then switches to WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| SignetError::Database(format!("open: {e}")))?;

        conn.busy_timeout(busy_timeout)
            .map_err(|e| SignetError::Database(format!("busy timeout: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| SignetError::Database(format!("WAL pragma: {e}")))?;

        Self::init(conn)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SignetError::Database(format!("open in-memory: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| SignetError::Database(format!("foreign_keys pragma: {e}")))?;
        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| SignetError::Database(format!("create tables: {e}")))?;

        debug!("signature store opened");
        Ok(Self { conn })
    }

    fn query_signatures(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<SignatureEntity>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| SignetError::Database(format!("prepare: {e}")))?;

        stmt.query_map(args, row_to_signature)
            .map_err(|e| SignetError::Database(format!("query: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SignetError::Database(format!("collect rows: {e}")))
    }

    fn transition(&self, token: &SignatureToken, to: SignatureStatus) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE signatures SET status = ?2 WHERE token = ?1 AND status = ?3",
                params![token.as_str(), to.as_str(), SignatureStatus::Pending.as_str()],
            )
            .map_err(|e| SignetError::Database(format!("mark {to}: {e}")))?;
        Ok(rows == 1)
    }
}

impl SignatureRepository for SqliteStore {
    #[instrument(skip_all, fields(document_id = %document.id, signers = signatures.len()))]
    fn insert_document(&self, document: &DocumentEntity, signatures: &[SignatureEntity]) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| SignetError::Database(format!("begin: {e}")))?;

        tx.execute(
            "INSERT INTO documents (id, title, status, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                document.id.to_string(),
                document.title,
                document.status.as_str(),
                document.expires_at.map(timestamp),
                timestamp(document.created_at),
                timestamp(document.updated_at),
            ],
        )
        .map_err(|e| SignetError::Database(format!("insert document: {e}")))?;

        for signature in signatures {
            let data_json = signature.data.as_ref().map(serde_json::to_string).transpose()?;
            tx.execute(
                "INSERT INTO signatures (id, token, document_id, signer_name, signer_email,
                 status, signed_at, origin_address, user_agent, path, signature_data,
                 artifact_digest, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    signature.id.to_string(),
                    signature.token.as_str(),
                    signature.document_id.to_string(),
                    signature.signer.name,
                    signature.signer.email,
                    signature.status.as_str(),
                    signature.signed_at.map(timestamp),
                    signature.provenance.origin_address,
                    signature.provenance.user_agent,
                    signature.path.as_ref().map(SignaturePath::as_str),
                    data_json,
                    signature.artifact_digest,
                    timestamp(signature.created_at),
                ],
            )
            .map_err(|e| SignetError::Database(format!("insert signature: {e}")))?;
        }

        tx.commit()
            .map_err(|e| SignetError::Database(format!("commit: {e}")))?;

        info!("document inserted");
        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id))]
    fn document(&self, id: &DocumentId) -> Result<Option<DocumentEntity>> {
        self.conn
            .query_row(
                "SELECT id, title, status, expires_at, created_at, updated_at
                 FROM documents WHERE id = ?1",
                params![id.to_string()],
                row_to_document,
            )
            .optional()
            .map_err(|e| SignetError::Database(format!("get document: {e}")))
    }

    #[instrument(skip_all)]
    fn signature_by_token(&self, token: &SignatureToken) -> Result<Option<SignatureEntity>> {
        let sql = format!("SELECT {SIGNATURE_COLUMNS} FROM signatures WHERE token = ?1");
        self.conn
            .query_row(&sql, params![token.as_str()], row_to_signature)
            .optional()
            .map_err(|e| SignetError::Database(format!("get signature: {e}")))
    }

    #[instrument(skip(self), fields(document_id = %id))]
    fn signatures_for_document(&self, id: &DocumentId) -> Result<Vec<SignatureEntity>> {
        let sql = format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures
             WHERE document_id = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let signatures = self.query_signatures(&sql, params![id.to_string()])?;
        debug!(count = signatures.len(), "loaded document signatures");
        Ok(signatures)
    }

    #[instrument(skip(self))]
    fn overdue_pending(&self, now: DateTime<Utc>) -> Result<Vec<SignatureEntity>> {
        let sql = format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures
             WHERE status = ?1 AND document_id IN (
                 SELECT id FROM documents WHERE expires_at IS NOT NULL AND expires_at < ?2
             )
             ORDER BY created_at ASC, rowid ASC"
        );
        self.query_signatures(&sql, params![SignatureStatus::Pending.as_str(), timestamp(now)])
    }

    fn mark_expired(&self, token: &SignatureToken) -> Result<bool> {
        self.transition(token, SignatureStatus::Expired)
    }

    fn mark_declined(&self, token: &SignatureToken) -> Result<bool> {
        self.transition(token, SignatureStatus::Declined)
    }

    #[instrument(skip_all, fields(signed_at = %artifact.signed_at))]
    fn mark_signed(&self, token: &SignatureToken, artifact: &SignedArtifact) -> Result<bool> {
        let data_json = serde_json::to_string(&artifact.data)?;

        let rows = self
            .conn
            .execute(
                "UPDATE signatures
                 SET status = ?2, signed_at = ?3, origin_address = ?4, user_agent = ?5,
                     path = ?6, signature_data = ?7, artifact_digest = ?8
                 WHERE token = ?1 AND status = ?9",
                params![
                    token.as_str(),
                    SignatureStatus::Signed.as_str(),
                    timestamp(artifact.signed_at),
                    artifact.provenance.origin_address,
                    artifact.provenance.user_agent,
                    artifact.path.as_str(),
                    data_json,
                    artifact.digest,
                    SignatureStatus::Pending.as_str(),
                ],
            )
            .map_err(|e| SignetError::Database(format!("mark signed: {e}")))?;

        Ok(rows == 1)
    }

    #[instrument(skip(self), fields(document_id = %id))]
    fn complete_document(&self, id: &DocumentId, at: DateTime<Utc>) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE documents SET status = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = ?4
                   AND EXISTS (SELECT 1 FROM signatures WHERE document_id = ?1)
                   AND NOT EXISTS (
                       SELECT 1 FROM signatures WHERE document_id = ?1 AND status <> ?5
                   )",
                params![
                    id.to_string(),
                    DocumentStatus::Completed.as_str(),
                    timestamp(at),
                    DocumentStatus::Sent.as_str(),
                    SignatureStatus::Signed.as_str(),
                ],
            )
            .map_err(|e| SignetError::Database(format!("complete document: {e}")))?;

        Ok(rows == 1)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(
    index: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(index, e))
}

fn parse_uuid(index: usize, value: &str) -> rusqlite::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(value).map_err(|e| conversion_err(index, e))
}

/// Column indices must match the SELECT order used in `document`.
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentEntity> {
    let id: String = row.get(0)?;
    let status: String = row.get(2)?;
    let expires_at: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(DocumentEntity {
        id: DocumentId(parse_uuid(0, &id)?),
        title: row.get(1)?,
        status: status.parse().map_err(|e| conversion_err(2, e))?,
        expires_at: expires_at
            .as_deref()
            .map(|value| parse_timestamp(3, value))
            .transpose()?,
        created_at: parse_timestamp(4, &created_at)?,
        updated_at: parse_timestamp(5, &updated_at)?,
    })
}

/// Column indices must match `SIGNATURE_COLUMNS`.
fn row_to_signature(row: &rusqlite::Row<'_>) -> rusqlite::Result<SignatureEntity> {
    let id: String = row.get(0)?;
    let token: String = row.get(1)?;
    let document_id: String = row.get(2)?;
    let status: String = row.get(5)?;
    let signed_at: Option<String> = row.get(6)?;
    let path: Option<String> = row.get(9)?;
    let data_json: Option<String> = row.get(10)?;
    let created_at: String = row.get(12)?;

    let data: Option<SignatureData> = data_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| conversion_err(10, e))?;

    Ok(SignatureEntity {
        id: SignatureId(parse_uuid(0, &id)?),
        token: SignatureToken::from_string(token),
        document_id: DocumentId(parse_uuid(2, &document_id)?),
        signer: Signer {
            name: row.get(3)?,
            email: row.get(4)?,
        },
        status: status.parse::<SignatureStatus>().map_err(|e| conversion_err(5, e))?,
        signed_at: signed_at
            .as_deref()
            .map(|value| parse_timestamp(6, value))
            .transpose()?,
        provenance: Provenance {
            origin_address: row.get(7)?,
            user_agent: row.get(8)?,
        },
        path: path.map(SignaturePath::new),
        data,
        artifact_digest: row.get(11)?,
        created_at: parse_timestamp(12, &created_at)?,
    })
}
