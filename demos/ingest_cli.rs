//! Ingest CLI Example
//!
//! This example parses a local XLSX watch-list and prints the accepted
//! movie records as JSON, the same documents that would be upserted.

use std::process;

use sheetstage::{IngestBuilder, IngestError, MovieRecord};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --stats              Print row statistics to stderr");
        eprintln!("  --max-size <bytes>   Reject inputs larger than <bytes>");
        eprintln!("\nExamples:");
        eprintln!("  {} movies.xlsx", args[0]);
        eprintln!("  {} movies.xlsx --stats", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let mut show_stats = false;
    let mut builder = IngestBuilder::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--stats" => {
                show_stats = true;
                i += 1;
            }
            "--max-size" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --max-size requires a value");
                    process::exit(1);
                }
                let bytes = args[i + 1].parse::<u64>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid size: {}", args[i + 1]);
                    process::exit(1);
                });
                builder = builder.with_max_input_size(bytes);
                i += 2;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    match parse_file(builder, input_path, show_stats) {
        Ok(movies) => match serde_json::to_string_pretty(&movies) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("JSON Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn parse_file(
    builder: IngestBuilder,
    input_path: &str,
    show_stats: bool,
) -> Result<Vec<MovieRecord>, IngestError> {
    let ingestor = builder.build()?;
    let bytes = std::fs::read(input_path)?;

    let (movies, stats) = ingestor.parse_with_stats(&bytes)?;
    if show_stats {
        eprintln!(
            "rows: {}, accepted: {}, rejected: {}",
            stats.rows_seen, stats.accepted, stats.rejected
        );
    }

    Ok(movies)
}

fn handle_error(error: IngestError) {
    match error {
        IngestError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        IngestError::MalformedDocument(msg) => {
            eprintln!("Malformed Document: {}", msg);
            eprintln!("The file may not be a valid Excel file or may be corrupted.");
        }
        IngestError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
            eprintln!("The file violates security constraints (e.g., file size limit).");
        }
        IngestError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        other => {
            eprintln!("Error: {}", other);
        }
    }
}
