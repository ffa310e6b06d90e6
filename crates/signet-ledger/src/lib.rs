// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signet Ledger: signature lifecycle and multi-party document completion.
// This crate ties the pure geometry in `signet-geometry` to persisted
// signature and document state, with every transition applied as a single
// conditional update.

pub mod completion;
pub mod manager;
pub mod store;

pub use completion::{CompletionAggregator, CompletionOutcome};
pub use manager::{DeclineOutcome, IssuedDocument, SignOutcome, SignatureManager};
pub use store::{SignatureRepository, SignedArtifact, SqliteStore};
