// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature record manager: the per-signature state machine.
//
//   PENDING --sign-->    SIGNED
//   PENDING --decline--> DECLINED
//   PENDING --expiry-->  EXPIRED
//
// All three targets are terminal.  Expiry is lazy: it is detected and
// applied whenever a signature is looked up, so an expired signature can
// never be signed even if no sweep ever runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use signet_core::config::SignetConfig;
use signet_core::error::{Result, SignetError};
use signet_core::types::{
    CaptureLimits, DocumentEntity, DocumentId, DocumentStatus, LifecycleEvent, Provenance,
    SignatureData, SignatureEntity, SignatureId, SignaturePath, SignatureStatus, SignatureToken,
    Signer,
};
use signet_geometry::{DEFAULT_TOLERANCE, render};
use signet_security::audit::{AuditAction, AuditLog};
use signet_security::integrity::artifact_digest;
use signet_security::token::{fingerprint, generate_token};

use crate::completion::{CompletionAggregator, CompletionOutcome};
use crate::store::{SignatureRepository, SignedArtifact};

/// What a successful `sign` did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignOutcome {
    pub signature_id: SignatureId,
    pub document_id: DocumentId,
    pub signed_at: DateTime<Utc>,
    pub path: SignaturePath,
    /// Every signature of the owning document is now SIGNED and the
    /// document is COMPLETED.
    pub all_signed: bool,
    /// Transitions performed by this call, for the caller to notify on.
    pub events: Vec<LifecycleEvent>,
}

/// What a successful `decline` did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineOutcome {
    pub signature_id: SignatureId,
    pub document_id: DocumentId,
    pub events: Vec<LifecycleEvent>,
}

/// A freshly sent document and the signing tokens for its signers.
#[derive(Debug, Clone)]
pub struct IssuedDocument {
    pub document: DocumentEntity,
    pub signatures: Vec<SignatureEntity>,
}

/// Owns the lifecycle of individual signature requests.
pub struct SignatureManager<R> {
    repo: R,
    tolerance: f64,
    limits: CaptureLimits,
    audit: Option<AuditLog>,
}

impl<R: SignatureRepository> SignatureManager<R> {
    /// Manager with the default tolerance and capture limits, no audit.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            tolerance: DEFAULT_TOLERANCE,
            limits: CaptureLimits::default(),
            audit: None,
        }
    }

    pub fn with_config(repo: R, config: &SignetConfig) -> Self {
        Self {
            repo,
            tolerance: config.simplify_tolerance,
            limits: config.capture_limits,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit.as_ref()
    }

    fn aggregator(&self) -> CompletionAggregator<'_, R> {
        CompletionAggregator::new(&self.repo).with_audit(self.audit.as_ref())
    }

    // -- Issuing -------------------------------------------------------------

    /// Create a SENT document with one PENDING signature per signer.
    ///
    /// Sending is normally the surrounding system's job; this exists so that
    /// hosts without their own sender can still mint tokens.
    #[instrument(skip(self, signers), fields(signers = signers.len()))]
    pub fn issue_document(
        &self,
        title: &str,
        signers: Vec<Signer>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedDocument> {
        if signers.is_empty() {
            return Err(SignetError::Validation("a document needs at least one signer".into()));
        }

        let document = DocumentEntity::new(title, DocumentStatus::Sent, expires_at);
        let signatures = signers
            .into_iter()
            .map(|signer| -> Result<SignatureEntity> {
                Ok(SignatureEntity::pending(generate_token()?, document.id, signer))
            })
            .collect::<Result<Vec<_>>>()?;

        self.repo.insert_document(&document, &signatures)?;
        info!(document_id = %document.id, "document issued");
        Ok(IssuedDocument {
            document,
            signatures,
        })
    }

    // -- Lookup and expiry ---------------------------------------------------

    /// Find a signature by its token, applying lazy expiry.
    pub fn lookup(&self, token: &SignatureToken) -> Result<SignatureEntity> {
        self.lookup_at(token, Utc::now())
    }

    /// [`lookup`](Self::lookup) against an explicit clock.
    #[instrument(skip_all, fields(token = %fingerprint(token)))]
    pub fn lookup_at(&self, token: &SignatureToken, now: DateTime<Utc>) -> Result<SignatureEntity> {
        let mut entity = self
            .repo
            .signature_by_token(token)?
            .ok_or_else(|| SignetError::NotFound("signature".into()))?;

        if entity.status == SignatureStatus::Pending {
            let expires_at = self
                .repo
                .document(&entity.document_id)?
                .and_then(|document| document.expires_at);
            self.evaluate_expiry(&mut entity, expires_at, now)?;
        }

        debug!(status = %entity.status, "signature looked up");
        Ok(entity)
    }

    /// Expire `entity` if it is still PENDING and its document expired
    /// before `now`.
    ///
    /// The write is conditional on the stored status still being PENDING,
    /// so it never clobbers a concurrent sign or decline.  `entity` is
    /// updated to what is stored afterwards.  Returns whether this call
    /// performed the transition.
    pub fn evaluate_expiry(
        &self,
        entity: &mut SignatureEntity,
        document_expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(expires_at) = document_expires_at else {
            return Ok(false);
        };
        if entity.status != SignatureStatus::Pending || now <= expires_at {
            return Ok(false);
        }

        if self.repo.mark_expired(&entity.token)? {
            entity.status = SignatureStatus::Expired;
            info!(signature_id = %entity.id, %expires_at, "signature expired");
            self.audit(
                AuditAction::Expire,
                &fingerprint(&entity.token),
                true,
                Some(&format!("document {} expired at {expires_at}", entity.document_id)),
            );
            return Ok(true);
        }

        if let Some(current) = self.repo.signature_by_token(&entity.token)? {
            debug!(status = %current.status, "expiry lost to a concurrent transition");
            *entity = current;
        }
        Ok(false)
    }

    /// Eagerly expire every overdue PENDING signature.
    ///
    /// Optional: lazy expiry in [`lookup`](Self::lookup) is what guarantees
    /// correctness; this only lets a host with a scheduler surface expiries
    /// sooner.
    #[instrument(skip(self))]
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<LifecycleEvent>> {
        let mut events = Vec::new();
        for signature in self.repo.overdue_pending(now)? {
            if self.repo.mark_expired(&signature.token)? {
                self.audit(
                    AuditAction::Expire,
                    &fingerprint(&signature.token),
                    true,
                    Some("sweep"),
                );
                events.push(LifecycleEvent::Expired {
                    signature_id: signature.id,
                    document_id: signature.document_id,
                });
            }
        }
        info!(expired = events.len(), "expiry sweep finished");
        Ok(events)
    }

    // -- Transitions ---------------------------------------------------------

    /// Sign with `data`, recording `provenance` verbatim.
    ///
    /// Once the signature is stored the call succeeds.  If re-evaluating the
    /// owning document then fails, the error is logged, `all_signed` is
    /// false and no `DocumentCompleted` event is emitted; run
    /// [`recompute`](Self::recompute) to settle the document later.
    pub fn sign(
        &self,
        token: &SignatureToken,
        data: SignatureData,
        provenance: Provenance,
    ) -> Result<SignOutcome> {
        self.sign_at(token, data, provenance, Utc::now())
    }

    /// [`sign`](Self::sign) against an explicit clock.
    #[instrument(skip_all, fields(token = %fingerprint(token), strokes = data.strokes.len()))]
    pub fn sign_at(
        &self,
        token: &SignatureToken,
        data: SignatureData,
        provenance: Provenance,
        now: DateTime<Utc>,
    ) -> Result<SignOutcome> {
        let subject = fingerprint(token);

        if let Err(e) = data.validate(&self.limits) {
            warn!(error = %e, "signature data rejected");
            return Err(e);
        }

        let entity = self.lookup_at(token, now)?;
        if entity.status != SignatureStatus::Pending {
            warn!(status = %entity.status, "sign attempted on processed signature");
            self.audit(AuditAction::Sign, &subject, false, Some(entity.status.as_str()));
            return Err(rejection(entity.status));
        }

        let path = render(&data, self.tolerance);
        let digest = artifact_digest(&path, &data)?;
        debug!(points = data.point_count(), path_len = path.as_str().len(), "signature path synthesized");

        let artifact = SignedArtifact {
            signed_at: now,
            provenance,
            path,
            data,
            digest,
        };

        if !self.repo.mark_signed(token, &artifact)? {
            return Err(self.lost_race(token, AuditAction::Sign, &subject)?);
        }

        info!(signature_id = %entity.id, document_id = %entity.document_id, "signature signed");
        self.audit(
            AuditAction::Sign,
            &subject,
            true,
            Some(&format!("document {} digest {}", entity.document_id, artifact.digest)),
        );

        let mut events = vec![LifecycleEvent::Signed {
            signature_id: entity.id,
            document_id: entity.document_id,
        }];
        // The signature is committed; a failed completion check must not
        // hide that from the caller.
        let completion = match self.aggregator().recompute(&entity.document_id) {
            Ok(completion) => completion,
            Err(e) => {
                error!(error = %e, document_id = %entity.document_id, "completion check failed after signing");
                CompletionOutcome {
                    completed: false,
                    newly_completed: false,
                }
            }
        };
        if completion.newly_completed {
            events.push(LifecycleEvent::DocumentCompleted {
                document_id: entity.document_id,
            });
        }

        Ok(SignOutcome {
            signature_id: entity.id,
            document_id: entity.document_id,
            signed_at: now,
            path: artifact.path,
            all_signed: completion.completed,
            events,
        })
    }

    /// Decline to sign.  No path is synthesized.
    pub fn decline(&self, token: &SignatureToken) -> Result<DeclineOutcome> {
        self.decline_at(token, Utc::now())
    }

    /// [`decline`](Self::decline) against an explicit clock.
    #[instrument(skip_all, fields(token = %fingerprint(token)))]
    pub fn decline_at(&self, token: &SignatureToken, now: DateTime<Utc>) -> Result<DeclineOutcome> {
        let subject = fingerprint(token);

        let entity = self.lookup_at(token, now)?;
        if entity.status != SignatureStatus::Pending {
            warn!(status = %entity.status, "decline attempted on processed signature");
            self.audit(AuditAction::Decline, &subject, false, Some(entity.status.as_str()));
            return Err(rejection(entity.status));
        }

        if !self.repo.mark_declined(token)? {
            return Err(self.lost_race(token, AuditAction::Decline, &subject)?);
        }

        info!(signature_id = %entity.id, document_id = %entity.document_id, "signature declined");
        self.audit(
            AuditAction::Decline,
            &subject,
            true,
            Some(&format!("document {}", entity.document_id)),
        );

        Ok(DeclineOutcome {
            signature_id: entity.id,
            document_id: entity.document_id,
            events: vec![LifecycleEvent::Declined {
                signature_id: entity.id,
                document_id: entity.document_id,
            }],
        })
    }

    /// Re-evaluate whether a document is fully signed.
    pub fn recompute(&self, document_id: &DocumentId) -> Result<CompletionOutcome> {
        self.aggregator().recompute(document_id)
    }

    // -- Helpers -------------------------------------------------------------

    /// The conditional update matched nothing: someone else transitioned the
    /// signature between our read and our write.  Work out what they did.
    fn lost_race(&self, token: &SignatureToken, action: AuditAction, subject: &str) -> Result<SignetError> {
        let current = self
            .repo
            .signature_by_token(token)?
            .ok_or_else(|| SignetError::NotFound("signature".into()))?;

        warn!(status = %current.status, %action, "lost transition race");
        self.audit(action, subject, false, Some(current.status.as_str()));
        Ok(rejection(current.status))
    }

    /// Record an audit entry; failures are logged, never propagated.
    fn audit(&self, action: AuditAction, subject: &str, success: bool, details: Option<&str>) {
        if let Some(log) = &self.audit {
            if let Err(e) = log.record(action, subject, success, details) {
                error!(error = %e, "failed to record audit entry");
            }
        }
    }
}

/// Map a non-PENDING status to the error a signer sees.
fn rejection(status: SignatureStatus) -> SignetError {
    match status {
        SignatureStatus::Expired => SignetError::Expired,
        other => SignetError::AlreadyProcessed { status: other },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::Duration;
    use signet_core::types::Point;

    use std::cell::Cell;

    /// Store wrapper that injects the interleavings a second connection
    /// could cause between our read and our write.
    struct Interleaved {
        inner: SqliteStore,
        expire_before_sign: Cell<bool>,
        fail_completion: Cell<bool>,
    }

    impl Interleaved {
        fn new() -> Self {
            Self {
                inner: SqliteStore::open_in_memory().expect("open in-memory db"),
                expire_before_sign: Cell::new(false),
                fail_completion: Cell::new(false),
            }
        }
    }

    impl SignatureRepository for Interleaved {
        fn insert_document(&self, document: &DocumentEntity, signatures: &[SignatureEntity]) -> Result<()> {
            self.inner.insert_document(document, signatures)
        }

        fn document(&self, id: &DocumentId) -> Result<Option<DocumentEntity>> {
            self.inner.document(id)
        }

        fn signature_by_token(&self, token: &SignatureToken) -> Result<Option<SignatureEntity>> {
            self.inner.signature_by_token(token)
        }

        fn signatures_for_document(&self, id: &DocumentId) -> Result<Vec<SignatureEntity>> {
            self.inner.signatures_for_document(id)
        }

        fn overdue_pending(&self, now: DateTime<Utc>) -> Result<Vec<SignatureEntity>> {
            self.inner.overdue_pending(now)
        }

        fn mark_expired(&self, token: &SignatureToken) -> Result<bool> {
            self.inner.mark_expired(token)
        }

        fn mark_declined(&self, token: &SignatureToken) -> Result<bool> {
            self.inner.mark_declined(token)
        }

        fn mark_signed(&self, token: &SignatureToken, artifact: &SignedArtifact) -> Result<bool> {
            if self.expire_before_sign.get() {
                assert!(self.inner.mark_expired(token)?);
            }
            self.inner.mark_signed(token, artifact)
        }

        fn complete_document(&self, id: &DocumentId, at: DateTime<Utc>) -> Result<bool> {
            if self.fail_completion.get() {
                return Err(SignetError::Database("disk I/O error".into()));
            }
            self.inner.complete_document(id, at)
        }
    }

    fn manager() -> SignatureManager<SqliteStore> {
        SignatureManager::new(SqliteStore::open_in_memory().expect("open in-memory db"))
    }

    fn signers(names: &[&str]) -> Vec<Signer> {
        names
            .iter()
            .map(|name| Signer {
                name: (*name).into(),
                email: format!("{}@example.org", name.to_ascii_lowercase()),
            })
            .collect()
    }

    fn scribble() -> SignatureData {
        SignatureData::new(vec![
            vec![Point::new(0.1, 0.5), Point::new(0.2, 0.3), Point::new(0.3, 0.6), Point::new(0.4, 0.4)],
            vec![Point::new(0.5, 0.5), Point::new(0.9, 0.5)],
        ])
    }

    fn provenance() -> Provenance {
        Provenance {
            origin_address: Some("198.51.100.23".into()),
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".into()),
        }
    }

    #[test]
    fn lookup_unknown_token_is_not_found() {
        let manager = manager();
        let result = manager.lookup(&SignatureToken::from_string("missing"));
        assert!(matches!(result, Err(SignetError::NotFound(_))));
    }

    #[test]
    fn sign_stores_path_data_and_provenance() {
        let manager = manager();
        let issued = manager.issue_document("Lease", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();

        let outcome = manager.sign(&token, scribble(), provenance()).unwrap();
        assert!(outcome.all_signed);
        assert!(!outcome.path.is_empty());

        let stored = manager.lookup(&token).unwrap();
        assert_eq!(stored.status, SignatureStatus::Signed);
        // Stored at microsecond precision.
        assert_eq!(
            stored.signed_at.map(|t| t.timestamp_micros()),
            Some(outcome.signed_at.timestamp_micros())
        );
        assert_eq!(stored.path, Some(outcome.path));
        assert_eq!(stored.data, Some(scribble()));
        assert_eq!(stored.provenance, provenance());
        assert!(signet_security::integrity::verify_artifact(&stored).is_ok());
    }

    #[test]
    fn invalid_data_is_rejected_before_any_transition() {
        let manager = manager();
        let issued = manager.issue_document("Lease", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();

        let bad = SignatureData::new(vec![vec![Point::new(0.5, 0.5)]]);
        assert!(matches!(
            manager.sign(&token, bad, Provenance::default()),
            Err(SignetError::Validation(_))
        ));
        assert_eq!(manager.lookup(&token).unwrap().status, SignatureStatus::Pending);
    }

    #[test]
    fn terminal_states_reject_sign_and_decline_without_mutation() {
        let manager = manager();
        let issued = manager
            .issue_document("Lease", signers(&["Signed", "Declined"]), None)
            .unwrap();
        let signed = issued.signatures[0].token.clone();
        let declined = issued.signatures[1].token.clone();

        manager.sign(&signed, scribble(), provenance()).unwrap();
        manager.decline(&declined).unwrap();

        for token in [&signed, &declined] {
            let before = manager.lookup(token).unwrap();
            assert!(matches!(
                manager.sign(token, scribble(), Provenance::default()),
                Err(SignetError::AlreadyProcessed { .. })
            ));
            assert!(matches!(
                manager.decline(token),
                Err(SignetError::AlreadyProcessed { .. })
            ));
            let after = manager.lookup(token).unwrap();
            assert_eq!(before.status, after.status);
            assert_eq!(before.path, after.path);
            assert_eq!(before.provenance, after.provenance);
        }
    }

    #[test]
    fn lookup_after_deadline_expires_signature() {
        let manager = manager();
        let now = Utc::now();
        let issued = manager
            .issue_document("Offer", signers(&["Ada"]), Some(now - Duration::hours(1)))
            .unwrap();
        let token = issued.signatures[0].token.clone();

        assert_eq!(manager.lookup(&token).unwrap().status, SignatureStatus::Expired);
        assert!(matches!(
            manager.sign(&token, scribble(), provenance()),
            Err(SignetError::Expired)
        ));
        assert!(matches!(manager.decline(&token), Err(SignetError::Expired)));
    }

    #[test]
    fn sign_detects_expiry_without_prior_lookup() {
        let manager = manager();
        let now = Utc::now();
        let issued = manager
            .issue_document("Offer", signers(&["Ada"]), Some(now + Duration::hours(1)))
            .unwrap();
        let token = issued.signatures[0].token.clone();

        let later = now + Duration::hours(2);
        assert!(matches!(
            manager.sign_at(&token, scribble(), provenance(), later),
            Err(SignetError::Expired)
        ));
        assert_eq!(manager.lookup(&token).unwrap().status, SignatureStatus::Expired);
    }

    #[test]
    fn deadline_not_yet_reached_keeps_signature_pending() {
        let manager = manager();
        let now = Utc::now();
        let issued = manager
            .issue_document("Offer", signers(&["Ada"]), Some(now + Duration::days(1)))
            .unwrap();
        let token = issued.signatures[0].token.clone();

        assert_eq!(manager.lookup_at(&token, now).unwrap().status, SignatureStatus::Pending);
    }

    #[test]
    fn evaluate_expiry_leaves_terminal_states_alone() {
        let manager = manager();
        let issued = manager.issue_document("Offer", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();
        manager.decline(&token).unwrap();

        let mut entity = manager.lookup(&token).unwrap();
        let past = Utc::now() - Duration::days(1);
        assert!(!manager.evaluate_expiry(&mut entity, Some(past), Utc::now()).unwrap());
        assert_eq!(entity.status, SignatureStatus::Declined);
    }

    #[test]
    fn evaluate_expiry_reflects_concurrent_transition() {
        let manager = manager();
        let issued = manager.issue_document("Offer", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();

        // Stale in-memory copy read before someone else declined.
        let mut stale = manager.lookup(&token).unwrap();
        manager.decline(&token).unwrap();

        let past = Utc::now() - Duration::days(1);
        assert!(!manager.evaluate_expiry(&mut stale, Some(past), Utc::now()).unwrap());
        assert_eq!(stale.status, SignatureStatus::Declined);
    }

    #[test]
    fn sweep_expires_only_overdue_pending() {
        let manager = manager();
        let now = Utc::now();
        let overdue = manager
            .issue_document("Old", signers(&["A", "B"]), Some(now - Duration::minutes(5)))
            .unwrap();
        manager
            .issue_document("Fresh", signers(&["C"]), Some(now + Duration::minutes(5)))
            .unwrap();

        let events = manager.expire_overdue(now).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(
            e,
            LifecycleEvent::Expired { document_id, .. } if *document_id == overdue.document.id
        )));

        // Nothing left to do on a second pass.
        assert!(manager.expire_overdue(now).unwrap().is_empty());
    }

    #[test]
    fn sign_losing_to_concurrent_expiry_reports_expired() {
        let manager = SignatureManager::new(Interleaved::new())
            .with_audit(AuditLog::open_in_memory().expect("audit"));
        let issued = manager.issue_document("Offer", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();

        // Lookup sees PENDING; the signature expires before the write lands.
        manager.repository().expire_before_sign.set(true);
        assert!(matches!(
            manager.sign(&token, scribble(), provenance()),
            Err(SignetError::Expired)
        ));

        let stored = manager.repository().signature_by_token(&token).unwrap().unwrap();
        assert_eq!(stored.status, SignatureStatus::Expired);
        assert!(stored.path.is_none());

        let entries = manager
            .audit_log()
            .unwrap()
            .entries_for_subject(&fingerprint(&token))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert_eq!(entries[0].details.as_deref(), Some("EXPIRED"));
    }

    #[test]
    fn failed_completion_check_still_reports_the_signature() {
        let manager = SignatureManager::new(Interleaved::new());
        let issued = manager.issue_document("Lease", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();
        let document_id = issued.document.id;

        manager.repository().fail_completion.set(true);
        let outcome = manager.sign(&token, scribble(), provenance()).unwrap();
        assert!(!outcome.all_signed);
        assert_eq!(
            outcome.events,
            vec![LifecycleEvent::Signed {
                signature_id: issued.signatures[0].id,
                document_id,
            }]
        );
        assert_eq!(manager.lookup(&token).unwrap().status, SignatureStatus::Signed);

        // Once storage recovers a later recompute settles the document.
        manager.repository().fail_completion.set(false);
        let completion = manager.recompute(&document_id).unwrap();
        assert!(completion.completed);
        assert!(completion.newly_completed);
    }

    #[test]
    fn issuing_requires_a_signer() {
        let manager = manager();
        assert!(matches!(
            manager.issue_document("Empty", Vec::new(), None),
            Err(SignetError::Validation(_))
        ));
    }

    #[test]
    fn transitions_are_audited_by_fingerprint() {
        let manager = manager().with_audit(AuditLog::open_in_memory().expect("audit"));
        let issued = manager.issue_document("Lease", signers(&["Ada"]), None).unwrap();
        let token = issued.signatures[0].token.clone();

        manager.sign(&token, scribble(), provenance()).unwrap();
        let _ = manager.decline(&token);

        let log = manager.audit_log().expect("audit enabled");
        let entries = log.entries_for_subject(&fingerprint(&token)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "sign");
        assert!(entries[0].success);
        assert_eq!(entries[1].action, "decline");
        assert!(!entries[1].success);

        // The raw token never appears in the trail.
        let recent = log.recent_entries(10).unwrap();
        assert!(recent.iter().all(|e| e.subject != token.as_str()
            && !e.details.as_deref().unwrap_or("").contains(token.as_str())));
    }
}
