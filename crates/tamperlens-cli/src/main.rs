// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tamperlens: PDF tampering triage.
//
// Entry point. Initialises logging on stderr, then runs the single-file or
// directory command.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tamperlens_cli::{Args, ExitStatus, inspect};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match inspect::run(args).await {
        Ok(status) => status.into(),
        Err(err) => {
            tracing::error!(error = %err, "Tamperlens failed");
            eprintln!("tamperlens: error: {err}");
            ExitStatus::Fatal.into()
        }
    }
}
