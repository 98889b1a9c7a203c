//! Command-line front end for runfs.
//!
//! Each invocation builds one request, hands it to the engine and renders
//! the result. The audit record is written by the engine either way.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use runfs::ops::ArchiveListingEntry;
use runfs::telemetry;
use runfs::{Cli, Command, Engine, OperationResult, Output, permissions};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init_logging(telemetry::level_for(cli.verbose, cli.quiet))?;

    let mut engine = Engine::new(&cli.engine_config()).context("failed to start engine")?;

    let result = match (&cli.command, cli.command.to_request()) {
        (_, Some(request)) => engine.execute(&request).await,
        (Command::Compress { source, destination }, None) => {
            engine.compress(source, destination).await
        }
        (Command::Decompress { archive, destination }, None) => {
            engine.decompress(archive, destination).await
        }
        (Command::List { archive }, None) => engine.list_archive(archive).await,
        (command, None) => anyhow::bail!("unhandled command {command:?}"),
    };

    render(&result, &cli);
    Ok(if result.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print the output on stdout and the status line on stderr.
fn render(result: &OperationResult, cli: &Cli) {
    if !result.succeeded {
        let kind = result.error_kind.map(|k| k.to_string()).unwrap_or_default();
        eprintln!("Error ({kind}): {}", result.message);
        return;
    }

    match &result.output {
        Some(Output::Content(content)) => print!("{content}"),
        Some(Output::Entries(names)) => {
            for name in names {
                println!("{name}");
            }
        }
        Some(Output::Permissions(value)) => println!("{}", permissions::encode(*value)),
        Some(Output::Archive(summary)) if !cli.is_quiet() => {
            eprintln!(
                "{} entries, {} -> {}",
                summary.entries,
                format_size(summary.uncompressed_bytes),
                format_size(summary.compressed_bytes)
            );
        }
        Some(Output::ArchiveListing(rows)) => print_listing(rows, cli.verbose > 0),
        _ => {}
    }

    if !cli.is_quiet() {
        eprintln!("{}", result.message);
    }
}

/// Plain names, or with `-v` a table with sizes, ratio and timestamps.
fn print_listing(rows: &[ArchiveListingEntry], verbose: bool) {
    if !verbose {
        for row in rows {
            println!("{}", row.name);
        }
        return;
    }

    println!(
        "{:>10}  {:>6}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Method", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(78));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for row in rows {
        let (year, month, day, hour, minute) = row.modified;
        println!(
            "{:>10}  {:>6}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            row.uncompressed_size,
            row.method,
            row.compressed_size,
            ratio(row.compressed_size, row.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            row.name
        );
        if !row.is_directory {
            total_uncompressed += row.uncompressed_size;
            total_compressed += row.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(78));
    println!(
        "{:>10}  {:>6}  {:>10}  {}  {:>17}  {} files",
        total_uncompressed,
        "",
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );
}

/// Space saved as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed >= uncompressed {
        return format!("{:>4}%", 0);
    }
    format!("{:>4}%", 100 - compressed * 100 / uncompressed)
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
