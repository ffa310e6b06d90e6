// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "signet",
    version,
    about = "Signature capture and multi-party contract completion"
)]
pub struct Cli {
    /// Directory holding config.json and the databases.
    #[arg(long, global = true, env = "SIGNET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a SENT document with one pending signature per signer
    Issue(IssueArgs),
    /// Render signature data to a vector path without touching storage
    Render(RenderArgs),
    /// Look up a signature by token, applying expiry
    Show(TokenArgs),
    /// Sign with captured stroke data
    Sign(SignArgs),
    /// Decline to sign
    Decline(TokenArgs),
    /// Document status, its signatures, and completion
    Status(StatusArgs),
    /// Expire every overdue pending signature now
    Sweep,
    /// Check a signed signature against its stored digest
    Verify(TokenArgs),
    /// Show audit trail entries
    Audit(AuditArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Document title.
    #[arg(long)]
    pub title: String,

    /// Signer as "Name <email>"; repeat for each signer.
    #[arg(long = "signer", required = true)]
    pub signers: Vec<String>,

    /// Expiry as an RFC 3339 timestamp.
    #[arg(long, conflicts_with = "expires_in_hours")]
    pub expires_at: Option<String>,

    /// Expiry relative to now.
    #[arg(long)]
    pub expires_in_hours: Option<i64>,
}

#[derive(Args, Debug)]
pub struct DataArgs {
    /// Signature data JSON file; "-" reads stdin.
    #[arg(long, default_value = "-")]
    pub data: PathBuf,

    /// Pixel width of the capture canvas.  Together with --canvas-height,
    /// the data is treated as raw pixels and normalized first.
    #[arg(long, requires = "canvas_height")]
    pub canvas_width: Option<f64>,

    #[arg(long, requires = "canvas_width")]
    pub canvas_height: Option<f64>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: DataArgs,

    /// Override the configured simplification tolerance.
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Signing token.
    pub token: String,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Signing token.
    pub token: String,

    #[command(flatten)]
    pub input: DataArgs,

    /// Network origin to record with the signature.
    #[arg(long)]
    pub origin: Option<String>,

    /// Client identification to record with the signature.
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Document id.
    pub document_id: String,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Only entries for this subject (token fingerprint or document id).
    #[arg(long)]
    pub subject: Option<String>,

    /// Maximum number of recent entries.
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also write it to config.json in the data directory.
    #[arg(long)]
    pub write: bool,
}
