//! Batch orchestration: discover, ingest in parallel, derive, verify.
//!
//! File reads fan out across a thread pool — there is no cross-file state at
//! ingestion — but aggregation starts only once every file has completed.
//! Skipped files become warnings, not failures; a batch with zero valid rows
//! is a legitimate empty result the caller must check for, not an error.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use stockledger_core::domain::MovementRecord;
use stockledger_core::ingest::{read_movement_file, ColumnAliases, IngestStats};
use stockledger_core::pipeline::{
    run_stages, verify_rollups, Grain, LedgerTables, PipelineError, StageProgress,
};

use crate::config::PipelineConfig;
use crate::discover::discover_csv_files;

/// Errors that abort a run. Skipped files and dropped rows are not errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot read input directory {}: {reason}", .path.display())]
    InputDir { path: PathBuf, reason: String },

    #[error(transparent)]
    Invariant(#[from] PipelineError),
}

/// A file excluded from the batch, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Normalized records pooled across all readable files.
#[derive(Debug)]
pub struct IngestedBatch {
    /// Records with the global input-order sequence assigned
    /// (sorted file order, then row order within each file).
    pub records: Vec<MovementRecord>,
    pub stats: IngestStats,
    pub skipped_files: Vec<FileWarning>,
    pub files_read: usize,
}

/// Result of one full pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub tables: LedgerTables,
    pub stats: IngestStats,
    pub skipped_files: Vec<FileWarning>,
    pub files_read: usize,
    pub record_count: usize,
    pub reference_date: NaiveDate,
    /// BLAKE3 over the normalized record set, for idempotence checks.
    pub dataset_hash: String,
}

impl PipelineOutput {
    /// True when the batch yielded zero valid rows. Callers must check this
    /// before rendering or exporting.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Ingest a pinned, ordered list of files in parallel.
pub fn ingest_batch(
    files: &[PathBuf],
    aliases: &ColumnAliases,
    progress: Option<&dyn StageProgress>,
) -> IngestedBatch {
    let total = files.len();
    let results: Vec<_> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            if let Some(p) = progress {
                p.on_file(path, index, total);
            }
            read_movement_file(path, aliases)
        })
        .collect();

    let mut records = Vec::new();
    let mut stats = IngestStats::default();
    let mut skipped_files = Vec::new();
    let mut files_read = 0usize;
    let mut next_seq = 0u64;

    // Collected order matches the input file order, so the global sequence
    // is independent of thread scheduling.
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(file_records) => {
                files_read += 1;
                stats.absorb(file_records.stats);
                for mut record in file_records.records {
                    record.seq = next_seq;
                    next_seq += 1;
                    records.push(record);
                }
            }
            Err(err) => skipped_files.push(FileWarning {
                path: path.clone(),
                reason: err.to_string(),
            }),
        }
    }

    IngestedBatch {
        records,
        stats,
        skipped_files,
        files_read,
    }
}

/// Discover inputs under `input_dir` and run the full pipeline.
pub fn run_pipeline(
    input_dir: &Path,
    config: &PipelineConfig,
    progress: Option<&dyn StageProgress>,
) -> Result<PipelineOutput, RunError> {
    let files =
        discover_csv_files(input_dir, config.recursive).map_err(|e| RunError::InputDir {
            path: input_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    let batch = ingest_batch(&files, &config.aliases, progress);

    let reference_date = config
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let tables = run_stages(&batch.records, reference_date, progress);

    // Conservation between the daily ledger and each rollup is a program
    // invariant; a mismatch is a bug and aborts the run.
    verify_rollups(&tables.daily, &tables.weekly, Grain::Weekly)?;
    verify_rollups(&tables.daily, &tables.monthly, Grain::Monthly)?;
    verify_rollups(&tables.daily, &tables.yearly, Grain::Yearly)?;

    let dataset_hash = compute_dataset_hash(&batch.records);

    Ok(PipelineOutput {
        tables,
        stats: batch.stats,
        skipped_files: batch.skipped_files,
        files_read: batch.files_read,
        record_count: batch.records.len(),
        reference_date,
        dataset_hash,
    })
}

/// Deterministic BLAKE3 hash over the normalized records in sequence order.
fn compute_dataset_hash(records: &[MovementRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        hasher.update(record.date.to_string().as_bytes());
        hasher.update(record.direction.as_str().as_bytes());
        hasher.update(record.owner_code.as_bytes());
        hasher.update(record.item_code.as_bytes());
        hasher.update(&record.quantity.to_le_bytes());
        hasher.update(&record.inventory_qty.to_le_bytes());
        hasher.update(record.desc.owner_name.as_bytes());
        hasher.update(record.desc.item_name.as_bytes());
        hasher.update(record.desc.uom.as_bytes());
        hasher.update(record.desc.destination_code.as_bytes());
        hasher.update(record.desc.destination_name.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
