// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan — desktop host.
//
// Entry point. Initialises logging, loads the config, and runs one scan request
// with page images from disk standing in for the camera.

mod acquisition;
mod prompt;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pagescan_bridge::{NoRetryPrompt, RetryPrompt, ScanAcquisition, ScanSession};
use pagescan_core::config::default_config_dir;
use pagescan_core::error::Result;
use pagescan_core::human_errors::{Severity, humanize_error};
use pagescan_core::{ScanArtifact, ScanConfig};

use acquisition::DirectoryAcquisition;
use prompt::TerminalPrompt;

/// Turn page images into scan results: numbered images or a single PDF.
#[derive(Debug, Parser)]
#[command(name = "pagescan", author, version, about, long_about = None)]
struct Cli {
    /// Request method, e.g. `scan_as_pdf`, `scan_as_images`, `scan_as_png`
    method: String,

    /// Page image files, or directories of them (read in file-name order)
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to the configured documents directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Directory holding config.json
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Never offer to retry a failed capture
    #[arg(long)]
    no_retry: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective config back to config.json
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Pagescan starting");

    let outcome = match load_config(&cli) {
        Ok(config) => run(&cli, config).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(artifact) => {
            if cli.json {
                match serde_json::to_string_pretty(&artifact) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("cannot serialize result: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", report::summarize(&artifact));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = err.code(), error = %err, "scan request failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            match human.severity {
                Severity::Quiet => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let dir = cli.config_dir.clone().unwrap_or_else(default_config_dir);
    let mut config = ScanConfig::load_or_default(&dir)?;
    if let Some(out_dir) = &cli.out_dir {
        config.documents_dir = out_dir.clone();
    }
    if cli.save_config {
        config.persist(&dir)?;
        tracing::info!(dir = %dir.display(), "config saved");
    }
    Ok(config)
}

async fn run(cli: &Cli, config: ScanConfig) -> Result<ScanArtifact> {
    let acquisition = DirectoryAcquisition::new(cli.inputs.clone());
    if cli.no_retry {
        handle(ScanSession::new(acquisition, NoRetryPrompt, config), &cli.method).await
    } else {
        handle(ScanSession::new(acquisition, TerminalPrompt, config), &cli.method).await
    }
}

async fn handle<P: RetryPrompt>(
    session: ScanSession<DirectoryAcquisition, P>,
    method: &str,
) -> Result<ScanArtifact> {
    tracing::info!(platform = session.acquisition().platform_name(), method, "handling request");
    session.handle(method).await
}
