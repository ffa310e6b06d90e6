// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads configuration and opens the signature store
// and audit trail for the CLI to call into.

use std::path::{Path, PathBuf};
use std::time::Duration;

use signet_core::SignetConfig;
use signet_core::error::{Result, SignetError};
use signet_ledger::{SignatureManager, SqliteStore};
use signet_security::audit::{AuditEntry, AuditLog};
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

/// Backend services for one CLI invocation.
pub struct AppServices {
    manager: SignatureManager<SqliteStore>,
    data_dir: PathBuf,
    config: SignetConfig,
}

impl AppServices {
    /// Open services in `dir` with an already-loaded config.
    ///
    /// Validates the config, then opens the signature store and, unless
    /// disabled, the audit trail.
    pub fn with_config(dir: PathBuf, config: SignetConfig) -> Result<Self> {
        config.validate()?;
        info!(path = %dir.display(), "initialising app services");

        let store = SqliteStore::open(
            dir.join(&config.database_file),
            Duration::from_millis(config.busy_timeout_ms),
        )?;
        let mut manager = SignatureManager::with_config(store, &config);
        if config.audit_enabled {
            manager = manager.with_audit(AuditLog::open(dir.join(&config.audit_file))?);
        } else {
            debug!("audit trail disabled by config");
        }

        Ok(Self {
            manager,
            data_dir: dir,
            config,
        })
    }

    pub fn manager(&self) -> &SignatureManager<SqliteStore> {
        &self.manager
    }

    // -- Audit ---------------------------------------------------------------

    fn audit_log(&self) -> Result<&AuditLog> {
        self.manager
            .audit_log()
            .ok_or_else(|| SignetError::Config("audit trail is disabled".into()))
    }

    /// Most recent audit entries, newest first.
    pub fn recent_audit_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        self.audit_log()?.recent_entries(limit)
    }

    /// Audit entries for one subject (token fingerprint or document id).
    pub fn audit_entries_for_subject(&self, subject: &str) -> Result<Vec<AuditEntry>> {
        self.audit_log()?.entries_for_subject(subject)
    }

    // -- Config Persistence --------------------------------------------------

    pub fn config(&self) -> &SignetConfig {
        &self.config
    }

    /// Write the active config back to the data directory.
    pub fn save_config(&self) -> Result<()> {
        persist_config(&self.data_dir, &self.config)
    }
}

/// Read `config.json` from `data_dir`, falling back to defaults when absent.
pub fn load_config(data_dir: &Path) -> Result<SignetConfig> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(SignetConfig::default());
    }
    let data = std::fs::read_to_string(&path)?;
    let config: SignetConfig = serde_json::from_str(&data)
        .map_err(|e| SignetError::Config(format!("{}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

fn persist_config(data_dir: &Path, config: &SignetConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
