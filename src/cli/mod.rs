//! Command line interface for the package bundler.

mod args;
pub mod config;

pub use args::Args;

use crate::{
    bundler::{
        BatchReport, BundleRequest, BundlerContext, BundlerRegistry, Dispatcher, FormatSelection,
    },
    error::{CliError, Result},
};
use anyhow::Context as _;
use std::io::Write;

/// Main CLI entry point
///
/// Returns the process exit code: 0 when every requested format produced an
/// artifact, 1 otherwise.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let registry = BundlerRegistry::standard();

    if args.list {
        emit(&serde_json::to_string_pretty(&registry.describe())?)?;
        return Ok(0);
    }

    let output_dir = args
        .output_dir
        .clone()
        .ok_or_else(|| CliError::InvalidArguments {
            reason: "--output-dir is required".to_string(),
        })?;
    let store = config::build_store(&args).await?;

    let ctx = BundlerContext::system()
        .with_verbose(args.verbose)
        .with_retain_working_dir(args.retain_working_dir);

    let report = Dispatcher::new(&registry, ctx)
        .run(BundleRequest {
            store,
            output_dir,
            selection: FormatSelection::from_ids(args.formats.iter().cloned()),
        })
        .await;

    if args.json {
        emit(&report.to_json()?)?;
    } else {
        print_report(&report);
    }

    Ok(if report.all_succeeded() { 0 } else { 1 })
}

/// Writes machine-readable output to stdout.
fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").context("Failed to write output to stdout")?;
    Ok(())
}

fn print_report(report: &BatchReport) {
    if report.outcomes.is_empty() {
        eprintln!("No bundler can run on this host; pass --format to choose one.");
        return;
    }
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(artifact) => println!(
                "✓ {}: {} ({} bytes, sha256 {})",
                outcome.format,
                artifact.path.display(),
                artifact.size,
                artifact.checksum
            ),
            Err(e) => {
                eprintln!("✗ {}: {}", outcome.format, e);
                if let Some(advice) = e.advice() {
                    eprintln!("  hint: {advice}");
                }
            }
        }
    }
}
