// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Signet signature engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SignetError};

/// Fewest points a stroke may carry; anything shorter is not a gesture.
pub const MIN_POINTS_PER_STROKE: usize = 2;
/// Hard ceiling on sampled points per stroke.
pub const MAX_POINTS_PER_STROKE: usize = 1000;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A sampled pointer position.
///
/// Depending on context the coordinates are either raw canvas pixels or
/// normalized to `[0, 1]` on each axis.  Persisted signature data is always
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite and inside `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }
}

/// One continuous pointer-down to pointer-up gesture.
pub type Stroke = Vec<Point>;

/// Limits applied to submitted signature data before any geometry work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureLimits {
    /// Maximum number of strokes in one signature.
    pub max_strokes: usize,
    /// Maximum points per stroke (capped at [`MAX_POINTS_PER_STROKE`]).
    pub max_points_per_stroke: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            max_strokes: 100,
            max_points_per_stroke: MAX_POINTS_PER_STROKE,
        }
    }
}

/// Normalized strokes in drawing order, as handed over by the capture surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureData {
    pub strokes: Vec<Stroke>,
}

impl SignatureData {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    /// Total number of sampled points across all strokes.
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Vec::len).sum()
    }

    /// Reject malformed submissions: no strokes, too many strokes, strokes
    /// outside the point-count bounds, or coordinates outside `[0, 1]`.
    pub fn validate(&self, limits: &CaptureLimits) -> Result<()> {
        if self.strokes.is_empty() {
            return Err(SignetError::Validation("at least one stroke is required".into()));
        }
        if self.strokes.len() > limits.max_strokes {
            return Err(SignetError::Validation(format!(
                "{} strokes exceeds the limit of {}",
                self.strokes.len(),
                limits.max_strokes
            )));
        }

        let max_points = limits.max_points_per_stroke.min(MAX_POINTS_PER_STROKE);
        for (index, stroke) in self.strokes.iter().enumerate() {
            if stroke.len() < MIN_POINTS_PER_STROKE {
                return Err(SignetError::Validation(format!(
                    "stroke {index} has {} point(s), at least {MIN_POINTS_PER_STROKE} required",
                    stroke.len()
                )));
            }
            if stroke.len() > max_points {
                return Err(SignetError::Validation(format!(
                    "stroke {index} has {} points, at most {max_points} allowed",
                    stroke.len()
                )));
            }
            if let Some(bad) = stroke.iter().position(|p| !p.is_normalized()) {
                return Err(SignetError::Validation(format!(
                    "stroke {index} point {bad} is outside the normalized range [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// A synthesized vector path (SVG path-data syntax) in the canonical
/// 600×200 viewport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignaturePath(String);

impl SignaturePath {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SignaturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Internal primary key of a signature row.  Never presented to signers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureId(pub Uuid);

impl SignatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SignatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the document a signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = SignetError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SignetError::Validation(format!("invalid document id {s:?}: {e}")))
    }
}

/// Opaque, unguessable capability token handed to a signer.
///
/// Possession of the token is what grants the right to sign, so `Debug`
/// never prints it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureToken(String);

impl SignatureToken {
    /// Wrap an existing token string (e.g. taken from a signing link).
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignatureToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

/// Lifecycle states of a single signer's obligation.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureStatus {
    Pending,
    Signed,
    Declined,
    Expired,
}

impl SignatureStatus {
    /// Column value used in the persistence layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Signed => "SIGNED",
            Self::Declined => "DECLINED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureStatus {
    type Err = SignetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SIGNED" => Ok(Self::Signed),
            "DECLINED" => Ok(Self::Declined),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(SignetError::Database(format!("unknown signature status {other:?}"))),
        }
    }
}

/// Lifecycle states of a document.  Owned by the surrounding system; the
/// engine only ever moves `Sent` to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Completed,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = SignetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "SENT" => Ok(Self::Sent),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(SignetError::Database(format!("unknown document status {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Who is expected to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub name: String,
    pub email: String,
}

/// Where a signature was submitted from.  Both fields are opaque strings
/// supplied by the caller and stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub origin_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One signer's obligation on one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntity {
    pub id: SignatureId,
    pub token: SignatureToken,
    pub document_id: DocumentId,
    pub signer: Signer,
    pub status: SignatureStatus,
    /// Set only on the transition into `Signed`.
    pub signed_at: Option<DateTime<Utc>>,
    /// Captured only at signing time.
    pub provenance: Provenance,
    /// Synthesized path, set only on `Signed`.
    pub path: Option<SignaturePath>,
    /// Raw data the path was synthesized from, kept for non-repudiation.
    pub data: Option<SignatureData>,
    /// SHA-256 digest of the signed artifact (path + raw data).
    pub artifact_digest: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SignatureEntity {
    /// A fresh `Pending` signature.  Callers supply the token so that token
    /// generation stays with the security layer.
    pub fn pending(token: SignatureToken, document_id: DocumentId, signer: Signer) -> Self {
        Self {
            id: SignatureId::new(),
            token,
            document_id,
            signer,
            status: SignatureStatus::Pending,
            signed_at: None,
            provenance: Provenance::default(),
            path: None,
            data: None,
            artifact_digest: None,
            created_at: Utc::now(),
        }
    }
}

/// The parts of a document the engine reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntity {
    pub id: DocumentId,
    pub title: String,
    pub status: DocumentStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentEntity {
    pub fn new(title: impl Into<String>, status: DocumentStatus, expires_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            title: title.into(),
            status,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Transitions reported back to the caller so it can decide whether to
/// notify anyone.  The engine itself never sends notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Signed { signature_id: SignatureId, document_id: DocumentId },
    Declined { signature_id: SignatureId, document_id: DocumentId },
    Expired { signature_id: SignatureId, document_id: DocumentId },
    DocumentCompleted { document_id: DocumentId },
}
