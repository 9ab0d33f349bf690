//! Artifact export — CSV tables, JSON run summary, Markdown report.
//!
//! The core hands over six flat tables; this module owns how they land on
//! disk. Each run writes into its own timestamped directory:
//! - `daily_transaction.csv`, `weekly_transaction.csv`,
//!   `monthly_transaction.csv`, `yearly_transaction.csv`,
//!   `stock_aging.csv`, `storage_day.csv`
//! - `summary.json` — schema-versioned run manifest
//! - `report.md` — human-readable run summary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockledger_core::domain::{AgingRow, LedgerRow, RollupRow, StorageDayRow};
use stockledger_core::ingest::IngestStats;

use crate::runner::{FileWarning, PipelineOutput};

pub const SCHEMA_VERSION: u32 = 1;

// ─── CSV tables ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Daily Transaction CSV (long form: one row per owner/item/date/direction).
pub fn export_ledger_csv(rows: &[LedgerRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "owner_code",
        "owner_name",
        "item_code",
        "item_name",
        "date",
        "direction",
        "quantity",
        "uom",
        "destination_code",
        "destination_name",
    ])?;
    for row in rows {
        wtr.write_record([
            &row.owner_code,
            &row.desc.owner_name,
            &row.item_code,
            &row.desc.item_name,
            &row.date.to_string(),
            row.direction.as_str(),
            &row.quantity.to_string(),
            &row.desc.uom,
            &row.desc.destination_code,
            &row.desc.destination_name,
        ])?;
    }
    finish(wtr)
}

/// Weekly/Monthly/Yearly Transaction CSV.
pub fn export_rollup_csv(rows: &[RollupRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "owner_code",
        "owner_name",
        "item_code",
        "item_name",
        "bucket_start",
        "direction",
        "quantity",
        "uom",
        "destination_code",
        "destination_name",
    ])?;
    for row in rows {
        wtr.write_record([
            &row.owner_code,
            &row.desc.owner_name,
            &row.item_code,
            &row.desc.item_name,
            &row.bucket_start.to_string(),
            row.direction.as_str(),
            &row.quantity.to_string(),
            &row.desc.uom,
            &row.desc.destination_code,
            &row.desc.destination_name,
        ])?;
    }
    finish(wtr)
}

/// Stock Aging CSV (wide form plus age).
pub fn export_aging_csv(rows: &[AgingRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "owner_code",
        "owner_name",
        "item_code",
        "item_name",
        "date",
        "stock_qty",
        "in_qty",
        "out_qty",
        "uom",
        "age_days",
    ])?;
    for row in rows {
        let b = &row.balance;
        wtr.write_record([
            &b.owner_code,
            &b.desc.owner_name,
            &b.item_code,
            &b.desc.item_name,
            &b.date.to_string(),
            &b.stock_qty.to_string(),
            &b.in_qty.to_string(),
            &b.out_qty.to_string(),
            &b.desc.uom,
            &row.age_days.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Storage Day CSV (wide form plus movement and days-of-supply).
/// An undefined `storage_days` exports as an empty cell, never as 0.
pub fn export_storage_csv(rows: &[StorageDayRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "owner_code",
        "owner_name",
        "item_code",
        "item_name",
        "date",
        "stock_qty",
        "in_qty",
        "out_qty",
        "uom",
        "movement",
        "storage_days",
    ])?;
    for row in rows {
        let b = &row.balance;
        let storage_days = row
            .storage_days
            .map(|d| d.to_string())
            .unwrap_or_default();
        wtr.write_record([
            &b.owner_code,
            &b.desc.owner_name,
            &b.item_code,
            &b.desc.item_name,
            &b.date.to_string(),
            &b.stock_qty.to_string(),
            &b.in_qty.to_string(),
            &b.out_qty.to_string(),
            &b.desc.uom,
            &row.movement.to_string(),
            &storage_days,
        ])?;
    }
    finish(wtr)
}

// ─── Run summary ────────────────────────────────────────────────────

/// Schema-versioned manifest of one run, persisted as `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub reference_date: NaiveDate,
    pub dataset_hash: String,
    pub files_read: usize,
    pub record_count: usize,
    pub stats: IngestStats,
    pub skipped_files: Vec<FileWarning>,
    pub daily_rows: usize,
    pub weekly_rows: usize,
    pub monthly_rows: usize,
    pub yearly_rows: usize,
    pub stock_aging_rows: usize,
    pub storage_day_rows: usize,
}

impl RunSummary {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            reference_date: output.reference_date,
            dataset_hash: output.dataset_hash.clone(),
            files_read: output.files_read,
            record_count: output.record_count,
            stats: output.stats,
            skipped_files: output.skipped_files.clone(),
            daily_rows: output.tables.daily.len(),
            weekly_rows: output.tables.weekly.len(),
            monthly_rows: output.tables.monthly.len(),
            yearly_rows: output.tables.yearly.len(),
            stock_aging_rows: output.tables.stock_aging.len(),
            storage_day_rows: output.tables.storage_day.len(),
        }
    }
}

/// Human-readable Markdown summary of a run.
pub fn generate_summary_md(output: &PipelineOutput) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Stock Ledger Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Reference Date | {} |\n", output.reference_date));
    md.push_str(&format!("| Files Read | {} |\n", output.files_read));
    md.push_str(&format!("| Records | {} |\n", output.record_count));
    md.push_str(&format!(
        "| Rows Dropped (bad date) | {} |\n",
        output.stats.invalid_date
    ));
    md.push_str(&format!(
        "| Rows Dropped (unknown flag) | {} |\n",
        output.stats.unknown_direction
    ));
    md.push_str(&format!(
        "| Quantities Coerced to 0 | {} |\n",
        output.stats.quantity_coerced
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", output.dataset_hash));
    md.push('\n');

    md.push_str("## Tables\n\n");
    md.push_str("| Table | Rows |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!(
        "| Daily Transaction | {} |\n",
        output.tables.daily.len()
    ));
    md.push_str(&format!(
        "| Weekly Transaction | {} |\n",
        output.tables.weekly.len()
    ));
    md.push_str(&format!(
        "| Monthly Transaction | {} |\n",
        output.tables.monthly.len()
    ));
    md.push_str(&format!(
        "| Yearly Transaction | {} |\n",
        output.tables.yearly.len()
    ));
    md.push_str(&format!(
        "| Stock Aging | {} |\n",
        output.tables.stock_aging.len()
    ));
    md.push_str(&format!(
        "| Storage Day | {} |\n",
        output.tables.storage_day.len()
    ));
    md.push('\n');

    if !output.skipped_files.is_empty() {
        md.push_str("## Skipped Files\n\n");
        for warning in &output.skipped_files {
            md.push_str(&format!("- `{}`: {}\n", warning.path.display(), warning.reason));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save all six tables plus the summary manifest and report.
///
/// Creates `ledger_{timestamp}/` under `output_dir` and returns its path.
pub fn save_tables(output: &PipelineOutput, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "ledger_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(
        run_dir.join("daily_transaction.csv"),
        export_ledger_csv(&output.tables.daily)?,
    )?;
    std::fs::write(
        run_dir.join("weekly_transaction.csv"),
        export_rollup_csv(&output.tables.weekly)?,
    )?;
    std::fs::write(
        run_dir.join("monthly_transaction.csv"),
        export_rollup_csv(&output.tables.monthly)?,
    )?;
    std::fs::write(
        run_dir.join("yearly_transaction.csv"),
        export_rollup_csv(&output.tables.yearly)?,
    )?;
    std::fs::write(
        run_dir.join("stock_aging.csv"),
        export_aging_csv(&output.tables.stock_aging)?,
    )?;
    std::fs::write(
        run_dir.join("storage_day.csv"),
        export_storage_csv(&output.tables.storage_day)?,
    )?;

    let summary = RunSummary::from_output(output);
    let json = serde_json::to_string_pretty(&summary)
        .context("failed to serialize run summary")?;
    std::fs::write(run_dir.join("summary.json"), json)?;

    std::fs::write(run_dir.join("report.md"), generate_summary_md(output))?;

    Ok(run_dir)
}
