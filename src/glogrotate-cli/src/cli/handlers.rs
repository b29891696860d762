//! Run execution and report output.

use anyhow::{Context, Result};
use tracing::{info, warn};

use glogrotate_engine::{RunReport, Rotator};

use super::args::Cli;

/// Resolve the configuration, process every directory and print the report.
///
/// Directory failures are reported but do not make the run fail; only an
/// unusable configuration does.
pub fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.resolve_config()?;
    let rotator = Rotator::new(config).context("Failed to set up rotation")?;

    info!(
        base_dir = %rotator.config().base_dir.display(),
        directories = rotator.config().log_names.len(),
        dry_run = rotator.config().dry_run,
        "Starting rotation"
    );
    let report = rotator.run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    for failed in report.failures() {
        warn!(
            directory = %failed.directory.display(),
            error = failed.error.as_deref().unwrap_or_default(),
            "Directory was not fully processed"
        );
    }

    Ok(report)
}

fn print_summary(report: &RunReport) {
    if report.dry_run {
        println!("Dry run - no changes were made.");
        println!();
    }

    for dir in &report.directories {
        println!("{}", dir.directory.display());
        if let Some(error) = &dir.error {
            println!("  Error:            {}", error);
        }
        println!("  Compressed:       {}", dir.files_compressed);
        if dir.compression_failures > 0 {
            println!("  Compress failed:  {}", dir.compression_failures);
        }
        println!("  Deleted by age:   {}", dir.deleted_by_age);
        println!("  Deleted by size:  {}", dir.deleted_by_size);
        println!("  Freed:            {}", format_size(dir.bytes_freed));
    }

    println!();
    println!(
        "Processed {} directories in {}ms: {} compressed, {} deleted, {} freed",
        report.directories.len(),
        report.duration_ms,
        report.total_compressed(),
        report.total_deleted(),
        format_size(report.bytes_freed())
    );
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
