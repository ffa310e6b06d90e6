// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignetError};
use crate::types::{CaptureLimits, MAX_POINTS_PER_STROKE};

/// Persistent engine settings, loaded from `config.json` in the data
/// directory.  Missing fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignetConfig {
    /// Douglas–Peucker tolerance in normalized units.
    pub simplify_tolerance: f64,
    /// Limits enforced on submitted signature data.
    pub capture_limits: CaptureLimits,
    /// Record lifecycle transitions in the audit trail.
    pub audit_enabled: bool,
    /// File name of the signature database inside the data directory.
    pub database_file: String,
    /// File name of the audit database inside the data directory.
    pub audit_file: String,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: 0.001,
            capture_limits: CaptureLimits::default(),
            audit_enabled: true,
            database_file: "signet.db".into(),
            audit_file: "audit.db".into(),
            busy_timeout_ms: 5_000,
            log_filter: "info".into(),
        }
    }
}

impl SignetConfig {
    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance <= 0.0 {
            return Err(SignetError::Config(format!(
                "simplify_tolerance must be a positive number, got {}",
                self.simplify_tolerance
            )));
        }
        if self.capture_limits.max_strokes == 0 {
            return Err(SignetError::Config("capture_limits.max_strokes must be at least 1".into()));
        }
        if !(2..=MAX_POINTS_PER_STROKE).contains(&self.capture_limits.max_points_per_stroke) {
            return Err(SignetError::Config(format!(
                "capture_limits.max_points_per_stroke must be within 2..={MAX_POINTS_PER_STROKE}"
            )));
        }
        if self.database_file.trim().is_empty() || self.audit_file.trim().is_empty() {
            return Err(SignetError::Config("database file names must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SignetConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SignetConfig = serde_json::from_str(r#"{"audit_enabled": false}"#).unwrap();
        assert!(!config.audit_enabled);
        assert_eq!(config.simplify_tolerance, 0.001);
        assert_eq!(config.database_file, "signet.db");
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let config = SignetConfig {
            simplify_tolerance: 0.0,
            ..SignetConfig::default()
        };
        assert!(matches!(config.validate(), Err(SignetError::Config(_))));
    }
}
