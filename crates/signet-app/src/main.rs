// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signet: signature capture and multi-party contract completion
//
// Entry point. Resolves the data directory, loads configuration, initialises
// logging, and dispatches the subcommand.  Results go to stdout as JSON;
// logs and errors go to stderr.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use serde_json::{Value, json};

use signet_core::error::SignetError;
use signet_core::human_errors::humanize_error;

use cli::args::Cli;
use services::{app_services, data_dir};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => report(&SignetError::from(e)),
        },
        Err(e) => report(&e),
    }
}

fn run(cli: Cli) -> Result<Value, SignetError> {
    let dir = data_dir::data_dir(cli.data_dir.as_deref())?;
    let config = app_services::load_config(&dir)?;
    init_logging(&config.log_filter);

    tracing::debug!(path = %dir.display(), "signet starting");
    cli::commands::execute(cli.cmd, dir, config)
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(configured: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(configured)),
        )
        .init();
}

fn report(err: &SignetError) -> ExitCode {
    let human = humanize_error(err);
    let body = json!({
        "error": err.to_string(),
        "message": human.message,
        "suggestion": human.suggestion,
        "retriable": human.retriable,
        "severity": format!("{:?}", human.severity),
    });
    eprintln!("{body:#}");
    ExitCode::FAILURE
}
