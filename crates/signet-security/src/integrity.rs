// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact integrity: SHA-256 over what was signed, for tamper detection.

use sha2::{Digest, Sha256};
use signet_core::error::SignetError;
use signet_core::types::{SignatureData, SignatureEntity, SignaturePath};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Digest of a signed artifact: the synthesized path, a newline, then the
/// JSON encoding of the raw strokes it was produced from.
pub fn artifact_digest(path: &SignaturePath, data: &SignatureData) -> Result<String, SignetError> {
    let raw = serde_json::to_vec(data)?;
    let mut hasher = Sha256::new();
    hasher.update(path.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(&raw);
    Ok(hex::encode(hasher.finalize()))
}

/// Check a stored signature against the digest recorded at signing time.
///
/// Unsigned entities carry no artifact and always pass.
pub fn verify_artifact(entity: &SignatureEntity) -> Result<(), SignetError> {
    let (Some(path), Some(data), Some(expected)) =
        (&entity.path, &entity.data, &entity.artifact_digest)
    else {
        return Ok(());
    };

    let actual = artifact_digest(path, data)?;
    if &actual == expected {
        Ok(())
    } else {
        Err(SignetError::IntegrityMismatch {
            expected: expected.clone(),
            actual,
        })
    }
}
