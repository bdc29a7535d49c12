//! Batch processing command for multiple invoice PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invex_core::{Document, ExtractionResult, Pipeline};

use super::load_config;
use super::process::PipelineArgs;
use crate::export::{format_result, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = Arc::new(tokio::task::spawn_blocking(move || Pipeline::from_config(config)).await?);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // One document at a time; the pipeline is shared across files.
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let shared = Arc::clone(&pipeline);
        let file = path.clone();
        let outcome = tokio::task::spawn_blocking(move || process_single_file(&file, &shared)).await?;

        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                results.push(ProcessResult {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for entry in &successful {
            if let Some(result) = &entry.result {
                let output_name = entry
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &failed {
            println!(
                "  - {}: {}",
                entry.path.display(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(path: &Path, pipeline: &Pipeline) -> anyhow::Result<ExtractionResult> {
    let document = Document::from_path(path)?;
    Ok(pipeline.run(&document)?)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "total_amount",
        "pages",
        "scanned",
        "model_error",
        "processing_time_ms",
        "error",
    ])?;

    for entry in results {
        let filename = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = entry.processing_time_ms.to_string();

        if let Some(result) = &entry.result {
            let basic = &result.parsed_basic;
            let model_error = result
                .llm_error
                .as_ref()
                .map(|f| f.detail.as_str())
                .unwrap_or("");
            wtr.write_record([
                filename,
                "success",
                basic.invoice_number.as_deref().unwrap_or(""),
                basic.invoice_date.as_deref().unwrap_or(""),
                basic.total_amount.as_deref().unwrap_or(""),
                &result.page_count.to_string(),
                &result.scanned.to_string(),
                model_error,
                &time_ms,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                &time_ms,
                entry.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
