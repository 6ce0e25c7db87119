// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visusynth: batch image-to-searchable-text converter.
//
// Entry point. Initialises logging, parses arguments, and hands off to the
// service layer.

mod cli;
mod config_dir;
mod services;

use std::process::ExitCode;

use clap::Parser;
use visusynth_core::human_errors::humanize_error;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!("Visusynth starting");

    match services::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %err, "run ended with error");
            ExitCode::FAILURE
        }
    }
}
