// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// signet-security: Trust primitives for the signature engine.
//
// Capability-token generation, SHA-256 artifact digests for
// non-repudiation, and a tamper-evident audit trail of every lifecycle
// transition.

pub mod audit;
pub mod integrity;
pub mod token;

pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use integrity::{artifact_digest, hash_bytes, verify_artifact};
pub use token::{fingerprint, generate_token};
