// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for signers.
//
// Every error is mapped to plain English with a clear suggestion.  Expired
// links get their own wording so a signer is never told something generic
// like "already processed" when the real answer is "ask for a new link".

use crate::error::SignetError;

/// Severity of an error from the signer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Storage blip: trying again may work.
    Transient,
    /// The signer must do something (redraw, ask for a new link).
    ActionRequired,
    /// Nothing the signer can do changes the outcome.
    Final,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the signer should try (shown as body text).
    pub suggestion: String,
    /// Whether resubmitting the same request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `SignetError` into a `HumanError` a signer can act on.
pub fn humanize_error(err: &SignetError) -> HumanError {
    match err {
        SignetError::NotFound(_) => HumanError {
            message: "We couldn't find this signing request.".into(),
            suggestion: "Check that you opened the full link from your email. If it still fails, ask the sender to send it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SignetError::AlreadyProcessed { status } => HumanError {
            message: "This document has already been handled.".into(),
            suggestion: format!("No further action is needed from you. (Current status: {})", status.as_str().to_ascii_lowercase()),
            retriable: false,
            severity: Severity::Final,
        },

        SignetError::Expired => HumanError {
            message: "This signing link has expired.".into(),
            suggestion: "Please ask the sender for a new signing link.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SignetError::Validation(detail) => HumanError {
            message: "We couldn't read your signature.".into(),
            suggestion: format!("Please clear the pad and draw your signature again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SignetError::Database(_) | SignetError::Io(_) => HumanError {
            message: "We couldn't save your response right now.".into(),
            suggestion: "Please wait a moment and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SignetError::Token(_)
        | SignetError::IntegrityMismatch { .. }
        | SignetError::Serialization(_)
        | SignetError::Config(_) => HumanError {
            message: "Something went wrong on our side.".into(),
            suggestion: "Please try again later. If this keeps happening, contact the sender.".into(),
            retriable: false,
            severity: Severity::Final,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignatureStatus;

    #[test]
    fn expired_asks_for_new_link() {
        let human = humanize_error(&SignetError::Expired);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("expired"));
        assert!(!human.retriable);
    }

    #[test]
    fn already_signed_is_final() {
        let human = humanize_error(&SignetError::AlreadyProcessed {
            status: SignatureStatus::Signed,
        });
        assert_eq!(human.severity, Severity::Final);
        assert!(human.suggestion.contains("signed"));
    }

    #[test]
    fn database_failure_is_transient() {
        let human = humanize_error(&SignetError::Database("database is locked".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }
}
