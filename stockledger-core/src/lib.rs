//! StockLedger Core — movement normalization and the daily ledger pipeline.
//!
//! This crate contains the heart of the stock ledger derivation:
//! - Domain types (movement records, snapshots, ledger rows, rollup rows)
//! - Ingestion of heterogeneous CSV movement extracts into canonical records
//! - Movement aggregation with deterministic first-wins descriptive merge
//! - Point-in-time snapshot construction (running cumsum + terminal snapshot)
//! - Daily densification by forward-fill, per (owner, item) span
//! - Unified daily ledger dense in both dates and directions
//! - Parameterized weekly/monthly/yearly rollups (flows sum, levels take latest)
//! - Stock aging and storage-day metrics

pub mod calendar;
pub mod domain;
pub mod ingest;
pub mod pipeline;
