//! StockLedger CLI — derive the daily stock ledger from movement extracts.
//!
//! Commands:
//! - `run` — ingest a folder of CSV extracts, derive all six tables, and
//!   write them (plus a run summary) to an artifact directory
//! - `check` — ingest only: report skipped files and row drop counters
//!   without deriving or writing anything

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use stockledger_core::pipeline::StageProgress;
use stockledger_runner::{
    discover_csv_files, ingest_batch, run_pipeline, save_tables, PipelineConfig,
};

#[derive(Parser)]
#[command(
    name = "stockledger",
    about = "StockLedger CLI — daily stock ledger derivation and rollups"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and export the six derived tables.
    Run {
        /// Directory containing the CSV movement extracts.
        input_dir: PathBuf,

        /// Output directory for the run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Aging reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Path to a TOML config file (reference date, alias table).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not recurse into subdirectories.
        #[arg(long, default_value_t = false)]
        no_recursive: bool,

        /// Suppress progress output.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Validate the input files without deriving anything.
    Check {
        /// Directory containing the CSV movement extracts.
        input_dir: PathBuf,

        /// Path to a TOML config file (alias table).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not recurse into subdirectories.
        #[arg(long, default_value_t = false)]
        no_recursive: bool,
    },
}

/// Progress printed to stdout, one line per stage or file.
struct StdoutProgress;

impl StageProgress for StdoutProgress {
    fn on_stage(&self, label: &str, step: usize, total: usize) {
        println!("[{step}/{total}] {label}");
    }

    fn on_file(&self, path: &Path, index: usize, total: usize) {
        println!(
            "reading [{}/{}] {}",
            index + 1,
            total,
            path.display()
        );
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_toml_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn parse_as_of(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid --as-of date '{raw}' (expected YYYY-MM-DD)"))
}

fn cmd_run(
    input_dir: &Path,
    output_dir: &Path,
    as_of: Option<&str>,
    config_path: Option<&PathBuf>,
    no_recursive: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(raw) = as_of {
        config.reference_date = Some(parse_as_of(raw)?);
    }
    if no_recursive {
        config.recursive = false;
    }

    let progress = StdoutProgress;
    let progress_ref: Option<&dyn StageProgress> = if quiet { None } else { Some(&progress) };

    let output = run_pipeline(input_dir, &config, progress_ref)
        .with_context(|| format!("pipeline failed over {}", input_dir.display()))?;

    for warning in &output.skipped_files {
        eprintln!("WARNING: skipped {}: {}", warning.path.display(), warning.reason);
    }

    if output.is_empty() {
        bail!(
            "no valid movement rows found under {} ({} file(s) skipped, {} row(s) dropped)",
            input_dir.display(),
            output.skipped_files.len(),
            output.stats.rows_dropped()
        );
    }

    let run_dir = save_tables(&output, output_dir)?;
    println!(
        "wrote {} daily, {} weekly, {} monthly, {} yearly, {} aging, {} storage rows",
        output.tables.daily.len(),
        output.tables.weekly.len(),
        output.tables.monthly.len(),
        output.tables.yearly.len(),
        output.tables.stock_aging.len(),
        output.tables.storage_day.len(),
    );
    println!("artifacts: {}", run_dir.display());
    Ok(())
}

fn cmd_check(input_dir: &Path, config_path: Option<&PathBuf>, no_recursive: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    if no_recursive {
        config.recursive = false;
    }

    let files = discover_csv_files(input_dir, config.recursive)
        .with_context(|| format!("cannot read input directory {}", input_dir.display()))?;
    if files.is_empty() {
        bail!("no CSV files found under {}", input_dir.display());
    }

    let batch = ingest_batch(&files, &config.aliases, None);

    println!("files found:      {}", files.len());
    println!("files readable:   {}", batch.files_read);
    println!("rows read:        {}", batch.stats.rows_read);
    println!("rows kept:        {}", batch.stats.rows_kept);
    println!("bad dates:        {}", batch.stats.invalid_date);
    println!("unknown flags:    {}", batch.stats.unknown_direction);
    println!("coerced qty to 0: {}", batch.stats.quantity_coerced);

    for warning in &batch.skipped_files {
        eprintln!("WARNING: skipped {}: {}", warning.path.display(), warning.reason);
    }
    if batch.records.is_empty() {
        bail!("no valid movement rows — a run over these inputs would be empty");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Run {
            input_dir,
            output_dir,
            as_of,
            config,
            no_recursive,
            quiet,
        } => cmd_run(
            input_dir,
            output_dir,
            as_of.as_deref(),
            config.as_ref(),
            *no_recursive,
            *quiet,
        ),
        Commands::Check {
            input_dir,
            config,
            no_recursive,
        } => cmd_check(input_dir, config.as_ref(), *no_recursive),
    }
}
