// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Signet.

use thiserror::Error;

use crate::types::SignatureStatus;

/// Top-level error type for all Signet operations.
#[derive(Debug, Error)]
pub enum SignetError {
    // -- Lifecycle errors --
    #[error("{0} not found")]
    NotFound(String),

    #[error("signature already processed (status: {status})")]
    AlreadyProcessed { status: SignatureStatus },

    #[error("signing link has expired")]
    Expired,

    #[error("invalid signature data: {0}")]
    Validation(String),

    // -- Security errors --
    #[error("token generation failed: {0}")]
    Token(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SignetError {
    /// True for the lifecycle outcomes a signer can cause by double
    /// submission or by losing a race; these are not system faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AlreadyProcessed { .. } | Self::Expired | Self::Validation(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SignetError>;
