// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Completion aggregation: promote a document to COMPLETED once every one of
// its signatures is SIGNED.
//
// A single DECLINED or EXPIRED signature disqualifies the document for good;
// it stays at SENT until the surrounding system cancels or resends it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use signet_core::error::{Result, SignetError};
use signet_core::types::{DocumentId, DocumentStatus, SignatureStatus};
use signet_security::audit::{AuditAction, AuditLog};

use crate::store::SignatureRepository;

/// Result of re-evaluating a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// The document is COMPLETED after this evaluation.
    pub completed: bool,
    /// This call performed the SENT → COMPLETED transition.  At most one
    /// concurrent caller ever sees `true`, so it is safe to notify on.
    pub newly_completed: bool,
}

/// Re-evaluates a document's status from its signatures.
pub struct CompletionAggregator<'a, R> {
    repo: &'a R,
    audit: Option<&'a AuditLog>,
}

impl<'a, R: SignatureRepository> CompletionAggregator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo, audit: None }
    }

    pub fn with_audit(mut self, audit: Option<&'a AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Recompute completion for `document_id`.
    ///
    /// Idempotent: running it again on a COMPLETED document, or twice
    /// concurrently, performs the transition at most once.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub fn recompute(&self, document_id: &DocumentId) -> Result<CompletionOutcome> {
        let document = self
            .repo
            .document(document_id)?
            .ok_or_else(|| SignetError::NotFound(format!("document {document_id}")))?;

        let signatures = self.repo.signatures_for_document(document_id)?;
        let signed = signatures
            .iter()
            .filter(|s| s.status == SignatureStatus::Signed)
            .count();
        let eligible = !signatures.is_empty() && signed == signatures.len();

        if !eligible {
            debug!(signed, total = signatures.len(), "document not fully signed");
            return Ok(CompletionOutcome {
                completed: document.status == DocumentStatus::Completed,
                newly_completed: false,
            });
        }

        if document.status == DocumentStatus::Completed {
            debug!("document already completed");
            return Ok(CompletionOutcome {
                completed: true,
                newly_completed: false,
            });
        }

        if self.repo.complete_document(document_id, Utc::now())? {
            info!(signers = signatures.len(), "document completed");
            if let Some(audit) = self.audit {
                let details = format!("{} signer(s)", signatures.len());
                if let Err(e) = audit.record(AuditAction::Complete, &document_id.to_string(), true, Some(&details)) {
                    error!(error = %e, "failed to record audit entry");
                }
            }
            return Ok(CompletionOutcome {
                completed: true,
                newly_completed: true,
            });
        }

        // Either a concurrent recompute won the transition, or the document
        // is not in SENT (e.g. cancelled).  Report what is stored now.
        let current = self
            .repo
            .document(document_id)?
            .ok_or_else(|| SignetError::NotFound(format!("document {document_id}")))?;
        debug!(status = %current.status, "completion transition not applied");
        Ok(CompletionOutcome {
            completed: current.status == DocumentStatus::Completed,
            newly_completed: false,
        })
    }
}
