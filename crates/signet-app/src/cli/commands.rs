// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand dispatch.  Every command returns a JSON value for stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use tracing::{debug, info};

use signet_core::SignetConfig;
use signet_core::error::{Result, SignetError};
use signet_core::types::{
    DocumentId, Provenance, SignatureData, SignatureEntity, SignatureToken, Signer,
};
use signet_geometry::{CanvasSize, normalize_strokes, render};
use signet_ledger::SignatureRepository;
use signet_security::integrity::verify_artifact;
use signet_security::token::fingerprint;

use super::args::{
    AuditArgs, Command, ConfigArgs, DataArgs, IssueArgs, RenderArgs, SignArgs, StatusArgs,
};
use crate::services::app_services::AppServices;

/// Run `cmd` against the data directory `dir`.
///
/// `render` is pure geometry and never opens storage.
pub fn execute(cmd: Command, dir: PathBuf, config: SignetConfig) -> Result<Value> {
    let open = |dir, config| AppServices::with_config(dir, config);
    match cmd {
        Command::Render(args) => render_cmd(&args, &config),
        Command::Issue(args) => issue(&open(dir, config)?, &args),
        Command::Show(args) => show(&open(dir, config)?, &args.token),
        Command::Sign(args) => sign(&open(dir, config)?, args),
        Command::Decline(args) => decline(&open(dir, config)?, &args.token),
        Command::Status(args) => status(&open(dir, config)?, &args),
        Command::Sweep => sweep(&open(dir, config)?),
        Command::Verify(args) => verify(&open(dir, config)?, &args.token),
        Command::Audit(args) => audit(&open(dir, config)?, &args),
        Command::Config(args) => config_cmd(&open(dir, config)?, &args),
    }
}

// -- Commands ----------------------------------------------------------------

fn issue(services: &AppServices, args: &IssueArgs) -> Result<Value> {
    let signers = args
        .signers
        .iter()
        .map(|s| parse_signer(s))
        .collect::<Result<Vec<_>>>()?;
    let expires_at = expiry(args.expires_at.as_deref(), args.expires_in_hours, Utc::now())?;

    let issued = services
        .manager()
        .issue_document(&args.title, signers, expires_at)?;

    // The only place raw tokens are ever printed: they are the signing links.
    let signatures: Vec<Value> = issued
        .signatures
        .iter()
        .map(|s| {
            json!({
                "signature_id": s.id,
                "signer": s.signer,
                "token": s.token.as_str(),
                "fingerprint": fingerprint(&s.token),
            })
        })
        .collect();

    Ok(json!({
        "document": issued.document,
        "signatures": signatures,
    }))
}

fn render_cmd(args: &RenderArgs, config: &SignetConfig) -> Result<Value> {
    let tolerance = args.tolerance.unwrap_or(config.simplify_tolerance);
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(SignetError::Validation(format!(
            "tolerance must be a positive number, got {tolerance}"
        )));
    }

    let data = read_data(&args.input)?;
    let path = render(&data, tolerance);
    debug!(points = data.point_count(), "rendered signature data");

    Ok(json!({
        "path": path,
        "strokes": data.strokes.len(),
        "points": data.point_count(),
        "tolerance": tolerance,
    }))
}

fn show(services: &AppServices, token: &str) -> Result<Value> {
    let entity = services
        .manager()
        .lookup(&SignatureToken::from_string(token))?;
    Ok(signature_view(&entity))
}

fn sign(services: &AppServices, args: SignArgs) -> Result<Value> {
    let data = read_data(&args.input)?;
    let provenance = Provenance {
        origin_address: args.origin,
        user_agent: args.user_agent,
    };
    let outcome = services.manager().sign(
        &SignatureToken::from_string(args.token),
        data,
        provenance,
    )?;
    Ok(serde_json::to_value(outcome)?)
}

fn decline(services: &AppServices, token: &str) -> Result<Value> {
    let outcome = services
        .manager()
        .decline(&SignatureToken::from_string(token))?;
    Ok(serde_json::to_value(outcome)?)
}

fn status(services: &AppServices, args: &StatusArgs) -> Result<Value> {
    let document_id = DocumentId::from_str(&args.document_id)?;
    let manager = services.manager();

    let completion = manager.recompute(&document_id)?;
    let document = manager
        .repository()
        .document(&document_id)?
        .ok_or_else(|| SignetError::NotFound(format!("document {document_id}")))?;
    let signatures: Vec<Value> = manager
        .repository()
        .signatures_for_document(&document_id)?
        .iter()
        .map(signature_view)
        .collect();

    Ok(json!({
        "document": document,
        "signatures": signatures,
        "completion": completion,
    }))
}

fn sweep(services: &AppServices) -> Result<Value> {
    let events = services.manager().expire_overdue(Utc::now())?;
    info!(expired = events.len(), "sweep complete");
    Ok(json!({ "expired": events.len(), "events": events }))
}

fn verify(services: &AppServices, token: &str) -> Result<Value> {
    let entity = services
        .manager()
        .lookup(&SignatureToken::from_string(token))?;
    let Some(digest) = entity.artifact_digest.clone() else {
        return Err(SignetError::Validation(format!(
            "signature is {}, nothing to verify",
            entity.status
        )));
    };
    verify_artifact(&entity)?;
    Ok(json!({
        "signature_id": entity.id,
        "verified": true,
        "digest": digest,
    }))
}

fn audit(services: &AppServices, args: &AuditArgs) -> Result<Value> {
    let entries = match &args.subject {
        Some(subject) => services.audit_entries_for_subject(subject)?,
        None => services.recent_audit_entries(args.limit)?,
    };
    Ok(serde_json::to_value(entries)?)
}

fn config_cmd(services: &AppServices, args: &ConfigArgs) -> Result<Value> {
    if args.write {
        services.save_config()?;
        info!("configuration written");
    }
    Ok(serde_json::to_value(services.config())?)
}

// -- Helpers -----------------------------------------------------------------

/// Public view of a signature.  The raw token never leaves `issue`.
fn signature_view(entity: &SignatureEntity) -> Value {
    json!({
        "signature_id": entity.id,
        "document_id": entity.document_id,
        "fingerprint": fingerprint(&entity.token),
        "signer": entity.signer,
        "status": entity.status,
        "signed_at": entity.signed_at,
        "provenance": entity.provenance,
        "path": entity.path,
        "artifact_digest": entity.artifact_digest,
        "created_at": entity.created_at,
    })
}

/// Parse `Name <email>`.
fn parse_signer(raw: &str) -> Result<Signer> {
    let invalid = || SignetError::Validation(format!("signer must be \"Name <email>\", got {raw:?}"));

    let (name, rest) = raw.split_once('<').ok_or_else(invalid)?;
    let email = rest.trim_end().strip_suffix('>').ok_or_else(invalid)?.trim();
    let name = name.trim();
    if name.is_empty() || !email.contains('@') {
        return Err(invalid());
    }
    Ok(Signer {
        name: name.to_string(),
        email: email.to_string(),
    })
}

fn expiry(
    at: Option<&str>,
    in_hours: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    if let Some(at) = at {
        let parsed = DateTime::parse_from_rfc3339(at)
            .map_err(|e| SignetError::Validation(format!("invalid expiry {at:?}: {e}")))?;
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    match in_hours {
        Some(hours) => {
            let delta = TimeDelta::try_hours(hours)
                .ok_or_else(|| SignetError::Validation(format!("expiry of {hours}h is out of range")))?;
            now.checked_add_signed(delta)
                .map(Some)
                .ok_or_else(|| SignetError::Validation(format!("expiry of {hours}h is out of range")))
        }
        None => Ok(None),
    }
}

fn read_data(input: &DataArgs) -> Result<SignatureData> {
    let raw = read_input(&input.data)?;
    let data: SignatureData = serde_json::from_str(&raw)
        .map_err(|e| SignetError::Validation(format!("signature data: {e}")))?;

    match (input.canvas_width, input.canvas_height) {
        (Some(width), Some(height)) => {
            if !(width > 0.0 && height > 0.0) {
                return Err(SignetError::Validation("canvas dimensions must be positive".into()));
            }
            Ok(normalize_strokes(&data.strokes, CanvasSize { width, height }))
        }
        _ => Ok(data),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::TokenArgs;

    fn write_data(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("data.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn data_args(path: PathBuf) -> DataArgs {
        DataArgs {
            data: path,
            canvas_width: None,
            canvas_height: None,
        }
    }

    #[test]
    fn parse_signer_accepts_name_and_email() {
        let signer = parse_signer("Ada Lovelace <ada@example.org>").unwrap();
        assert_eq!(signer.name, "Ada Lovelace");
        assert_eq!(signer.email, "ada@example.org");
    }

    #[test]
    fn parse_signer_rejects_malformed_input() {
        for raw in ["Ada", "<ada@example.org>", "Ada <ada>", "Ada <ada@example.org"] {
            assert!(parse_signer(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn expiry_prefers_absolute_timestamp() {
        let now = Utc::now();
        let at = expiry(Some("2030-01-01T00:00:00Z"), None, now).unwrap().unwrap();
        assert_eq!(at.to_rfc3339(), "2030-01-01T00:00:00+00:00");
        assert_eq!(
            expiry(None, Some(2), now).unwrap(),
            Some(now + TimeDelta::hours(2))
        );
        assert_eq!(expiry(None, None, now).unwrap(), None);
        assert!(expiry(Some("tomorrow"), None, now).is_err());
    }

    #[test]
    fn render_normalizes_pixel_canvas() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_data(
            tmp.path(),
            r#"{"strokes":[[{"x":0.0,"y":0.0},{"x":600.0,"y":200.0}]]}"#,
        );
        let args = RenderArgs {
            input: DataArgs {
                data: path,
                canvas_width: Some(600.0),
                canvas_height: Some(200.0),
            },
            tolerance: None,
        };
        let out = render_cmd(&args, &SignetConfig::default()).unwrap();
        assert_eq!(out["path"], "M 0.0 0.0 L 600.0 200.0");
        assert_eq!(out["points"], 2);
    }

    #[test]
    fn render_never_opens_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let data = write_data(
            tmp.path(),
            r#"{"strokes":[[{"x":0.0,"y":0.0},{"x":1.0,"y":1.0}]]}"#,
        );
        let missing = tmp.path().join("does-not-exist");

        let out = execute(
            Command::Render(RenderArgs {
                input: data_args(data),
                tolerance: None,
            }),
            missing.clone(),
            SignetConfig::default(),
        )
        .unwrap();
        assert_eq!(out["path"], "M 0.0 0.0 L 600.0 200.0");
        assert!(!missing.exists());
    }

    #[test]
    fn issue_sign_status_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let run = |cmd: Command| execute(cmd, dir.clone(), SignetConfig::default());

        let issued = run(Command::Issue(IssueArgs {
            title: "NDA".into(),
            signers: vec!["Ada <ada@example.org>".into()],
            expires_at: None,
            expires_in_hours: Some(24),
        }))
        .unwrap();
        let token = issued["signatures"][0]["token"].as_str().unwrap().to_string();
        let document_id = issued["document"]["id"].as_str().unwrap().to_string();

        let data = write_data(
            tmp.path(),
            r#"{"strokes":[[{"x":0.1,"y":0.1},{"x":0.5,"y":0.5},{"x":0.9,"y":0.2}]]}"#,
        );
        let signed = run(Command::Sign(SignArgs {
            token: token.clone(),
            input: data_args(data),
            origin: Some("198.51.100.7".into()),
            user_agent: None,
        }))
        .unwrap();
        assert_eq!(signed["all_signed"], true);

        let status = run(Command::Status(StatusArgs {
            document_id: document_id.clone(),
        }))
        .unwrap();
        assert_eq!(status["document"]["status"], "COMPLETED");
        assert_eq!(status["signatures"][0]["status"], "SIGNED");
        assert!(status["signatures"][0].get("token").is_none());

        let verified = run(Command::Verify(TokenArgs { token: token.clone() })).unwrap();
        assert_eq!(verified["verified"], true);

        let again = run(Command::Decline(TokenArgs { token }));
        assert!(matches!(again, Err(SignetError::AlreadyProcessed { .. })));

        let audit = run(Command::Audit(AuditArgs {
            subject: None,
            limit: 10,
        }))
        .unwrap();
        assert!(audit.as_array().unwrap().len() >= 2);
    }

    #[test]
    fn verify_rejects_unsigned_signature() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let issued = execute(
            Command::Issue(IssueArgs {
                title: "Lease".into(),
                signers: vec!["Grace <grace@example.org>".into()],
                expires_at: None,
                expires_in_hours: None,
            }),
            dir.clone(),
            SignetConfig::default(),
        )
        .unwrap();
        let token = issued["signatures"][0]["token"].as_str().unwrap().to_string();

        let result = execute(
            Command::Verify(TokenArgs { token }),
            dir,
            SignetConfig::default(),
        );
        assert!(matches!(result, Err(SignetError::Validation(_))));
    }
}
