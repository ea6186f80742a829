//! GDSentry suite runner
//!
//! Loads a JSON suite manifest, runs each test case against a fresh test
//! context and prints a text or JSON report. Exits non-zero when any test
//! fails.

mod config;
mod manifest;
mod report;
mod runner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Config, ReportFormat};
use manifest::SuiteManifest;
use runner::SuiteRunner;

#[derive(Debug, Parser)]
#[command(name = "gdsentry-runner", version, about = "Run a GDSentry suite manifest")]
struct Cli {
    /// Path to the suite manifest (JSON)
    manifest: PathBuf,

    /// Per-test timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.timeout_ms, cli.json);

    let manifest = SuiteManifest::from_path(&cli.manifest)?;
    tracing::info!(
        suite = %manifest.suite,
        tests = manifest.tests.len(),
        timeout_ms = config.test_timeout.as_millis() as u64,
        "Running suite"
    );

    let report = SuiteRunner::new(manifest, config.test_timeout).run().await;

    match config.report_format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!(
            "{}",
            report.to_json().context("Failed to serialize report")?
        ),
    }

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}
