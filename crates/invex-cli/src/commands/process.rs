//! Process command - extract fields from a single invoice PDF.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invex_core::{BackendKind, Document, ExtractionResult, InvexConfig, Pipeline};

use super::load_config;
use crate::export::{format_result, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Flags that override the configured pipeline.
#[derive(Args, Clone, Default)]
pub struct PipelineArgs {
    /// Model backend (none, huggingface, openai, ollama)
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Model identifier for the selected backend
    #[arg(long)]
    model: Option<String>,

    /// Skip OCR on pages without a text layer
    #[arg(long)]
    no_ocr: bool,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut InvexConfig) {
        if let Some(backend) = self.backend {
            config.llm.backend = backend;
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if self.no_ocr {
            config.ocr.enabled = false;
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!(
        "Extracting {} (backend: {})...",
        args.input.display(),
        config.llm.backend
    ));

    let input = args.input.clone();
    let outcome = tokio::task::spawn_blocking(move || extract_file(input, config)).await?;

    pb.finish_and_clear();
    let result = outcome?;

    if let Some(failure) = &result.llm_error {
        eprintln!(
            "{} Model path failed ({}), baseline fields only: {}",
            style("⚠").yellow(),
            failure.error,
            failure.detail
        );
    }

    // Format output
    let output = format_result(&result, args.format)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the pipeline on one file. Blocking: model calls and OCR are synchronous.
pub fn extract_file(path: PathBuf, config: InvexConfig) -> anyhow::Result<ExtractionResult> {
    let document = Document::from_path(&path)?;
    let pipeline = Pipeline::from_config(config);
    pipeline
        .run(&document)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}
