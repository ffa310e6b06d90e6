// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability tokens: the only identifier a signer ever sees.
//
// A token is 256 bits from the OS CSPRNG, hex encoded.  Knowing a document
// id or a signature's internal id grants nothing; only the token does.

use ring::rand::{SecureRandom, SystemRandom};
use signet_core::error::SignetError;
use signet_core::types::SignatureToken;
use tracing::{debug, instrument};

use crate::integrity::hash_bytes;

/// Token entropy in bytes.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh, unguessable signing token.
#[instrument]
pub fn generate_token() -> Result<SignatureToken, SignetError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes)
        .map_err(|e| SignetError::Token(format!("system random source failed: {e}")))?;

    debug!("signing token generated");
    Ok(SignatureToken::from_string(hex::encode(bytes)))
}

/// Short, non-reversible label for a token, safe to put in logs and the
/// audit trail.
pub fn fingerprint(token: &SignatureToken) -> String {
    let mut digest = hash_bytes(token.as_str().as_bytes());
    digest.truncate(16);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = generate_token().expect("token generation failed");
        assert_eq!(token.as_str().len(), TOKEN_BYTES * 2);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_differ_each_time() {
        let a = generate_token().expect("gen a");
        let b = generate_token().expect("gen b");
        assert_ne!(a, b, "two generations must produce different tokens");
    }

    #[test]
    fn fingerprint_is_stable_and_does_not_leak_token() {
        let token = SignatureToken::from_string("00112233445566778899aabbccddeeff");
        let fp = fingerprint(&token);
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, fingerprint(&token));
        assert!(!token.as_str().contains(&fp));
    }
}
