// src/main.rs
mod utils;

mod document;
mod extractors;
mod pipeline;
mod sheet;

use std::path::PathBuf;

use clap::Parser;
use pipeline::ExtractOptions;
use sheet::Workbook;
use utils::error::WorkbookError;
use utils::AppError;

/// Command Line Interface for the CDP climate response extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workbook JSON file to create or update
    #[arg(short, long)]
    workbook: PathBuf,

    /// Saved CDP response pages (HTML), at most one per questionnaire version
    #[arg(required = true)]
    responses: Vec<String>,

    /// Company name, used in logs and the run report
    #[arg(short, long)]
    company: Option<String>,

    /// Cross-check reported figures and record implausible ones as findings
    #[arg(long)]
    validate: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug mode - dump section tokens for each response to a text file
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Load the target workbook, or start a fresh one
    let mut book = if args.workbook.exists() {
        tracing::info!("Updating existing workbook {:?}", args.workbook);
        Workbook::load(&args.workbook)?
    } else {
        Workbook::new()
    };

    // 4. Resolve versions and order the batch newest-first
    let ordered = pipeline::order_responses(&args.responses)?;
    match &args.company {
        Some(name) => tracing::info!("Processing {} responses for {}", ordered.len(), name),
        None => tracing::info!("Processing {} responses", ordered.len()),
    }

    let options = ExtractOptions {
        validate: args.validate,
    };

    let mut success_count = 0;
    let mut failure_count = 0;
    let mut processed = Vec::new();

    // 5. Extract each response into the workbook, newest first
    for response in &ordered {
        tracing::info!(
            "Processing version {} from {:?}",
            response.version,
            response.path
        );

        if args.debug {
            let stem = response
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("response");
            // Token dumps land next to the workbook.
            let dump = args.workbook.with_file_name(format!("{}_tokens.txt", stem));
            if let Err(e) =
                utils::debug::dump_section_tokens(&response.document, &dump.to_string_lossy())
            {
                tracing::warn!("Could not save section token dump: {}", e);
            }
        }

        match pipeline::process_response(&response.document, &mut book, options) {
            Ok(mut diag) => {
                if diag.is_empty() {
                    tracing::info!("Extracted version {} cleanly", response.version);
                } else {
                    tracing::info!(
                        "Extracted version {} with {} findings",
                        response.version,
                        diag.len()
                    );
                }
                success_count += 1;
                processed.push(serde_json::json!({
                    "version": response.version,
                    "path": response.path,
                    "status": "ok",
                    "warnings": diag.drain(),
                }));
            }
            Err(e) => {
                tracing::error!("Failed to extract version {}: {}", response.version, e);
                failure_count += 1;
                processed.push(serde_json::json!({
                    "version": response.version,
                    "path": response.path,
                    "status": "failed",
                    "error": e.to_string(),
                }));
            }
        }
    }

    // 6. Persist the workbook
    book.save(&args.workbook)?;
    tracing::info!("Saved workbook to {:?}", args.workbook);

    // 7. Optionally write the run report
    if let Some(report_path) = &args.report {
        let report = serde_json::json!({
            "company": args.company,
            "generated": chrono::Utc::now().to_rfc3339(),
            "workbook": args.workbook,
            "succeeded": success_count,
            "failed": failure_count,
            "responses": processed,
        });
        let body = serde_json::to_string_pretty(&report).map_err(WorkbookError::Serialization)?;
        std::fs::write(report_path, body)?;
        tracing::info!("Saved run report to {:?}", report_path);
    }

    tracing::info!(
        "Processing complete. Success: {}, Failure: {}",
        success_count,
        failure_count
    );

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract data from all {} responses",
            failure_count
        )));
    }

    Ok(())
}
