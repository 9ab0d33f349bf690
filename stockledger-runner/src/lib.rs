//! StockLedger Runner — batch orchestration over the core pipeline.
//!
//! This crate builds on `stockledger-core` to provide:
//! - Recursive, deterministic input-file discovery
//! - Parallel per-file ingestion with skip warnings and drop counters
//! - The end-to-end pipeline run with defensive rollup verification
//! - Pure query functions over the derived tables (no session state)
//! - CSV/JSON artifact export and a Markdown run summary

pub mod config;
pub mod discover;
pub mod export;
pub mod query;
pub mod runner;

pub use config::{ConfigError, PipelineConfig};
pub use discover::discover_csv_files;
pub use export::{
    export_aging_csv, export_ledger_csv, export_rollup_csv, export_storage_csv,
    generate_summary_md, save_tables, RunSummary, SCHEMA_VERSION,
};
pub use query::{filter_rollups, flow_series, RollupFilter, SeriesPoint};
pub use runner::{
    ingest_batch, run_pipeline, FileWarning, IngestedBatch, PipelineOutput, RunError,
};
