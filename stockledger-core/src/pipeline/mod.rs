//! The pipeline stages and their synchronous, batch driver.
//!
//! Stages run strictly in order, each fully materializing its output before
//! the next begins (whole-dataset cumulative sums do not stream). The driver
//! is a pure function of the normalized records and the reference date.

pub mod aggregate;
pub mod densify;
pub mod ledger;
pub mod metrics;
pub mod rollup;
pub mod snapshot;
pub mod verify;

pub use aggregate::aggregate_movements;
pub use densify::densify;
pub use ledger::{build_ledger, daily_balances};
pub use metrics::{stock_aging, storage_days};
pub use rollup::{rollup, Grain};
pub use snapshot::{merge_snapshots, movement_snapshots, terminal_snapshots};
pub use verify::{verify_rollups, PipelineError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{AgingRow, LedgerRow, MovementRecord, RollupRow, StorageDayRow};

/// Observer for pipeline progress. All methods default to no-ops.
pub trait StageProgress: Sync {
    /// A pipeline stage is starting. `step` is 1-based.
    fn on_stage(&self, _label: &str, _step: usize, _total: usize) {}

    /// An input file is being read. Called from worker threads.
    fn on_file(&self, _path: &Path, _index: usize, _total: usize) {}
}

/// No-op progress observer.
pub struct NoProgress;

impl StageProgress for NoProgress {}

/// The six derived tables of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTables {
    pub daily: Vec<LedgerRow>,
    pub weekly: Vec<RollupRow>,
    pub monthly: Vec<RollupRow>,
    pub yearly: Vec<RollupRow>,
    pub stock_aging: Vec<AgingRow>,
    pub storage_day: Vec<StorageDayRow>,
}

impl LedgerTables {
    /// True when the run produced nothing (zero valid rows after drops).
    /// Callers must check this before rendering or exporting.
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}

const STAGES: usize = 10;

/// Run all pipeline stages over normalized records.
///
/// `reference` is the aging reference date ("today"); it is the only
/// non-input-derived parameter, injected for testability.
pub fn run_stages(
    records: &[MovementRecord],
    reference: NaiveDate,
    progress: Option<&dyn StageProgress>,
) -> LedgerTables {
    let stage = |label: &str, step: usize| {
        if let Some(p) = progress {
            p.on_stage(label, step, STAGES);
        }
    };

    stage("aggregating movements", 1);
    let aggregated = aggregate_movements(records);

    stage("building movement snapshots", 2);
    let movement_snaps = movement_snapshots(&aggregated);

    stage("building terminal snapshots", 3);
    let terminal = terminal_snapshots(&aggregated);
    let merged = merge_snapshots(movement_snaps, terminal);

    stage("densifying daily stock", 4);
    let daily_stock = densify(&merged);

    stage("building daily ledger", 5);
    let daily = build_ledger(&aggregated, &daily_stock);
    let balances = daily_balances(&daily);

    stage("weekly rollup", 6);
    let weekly = rollup(&daily, Grain::Weekly);
    stage("monthly rollup", 7);
    let monthly = rollup(&daily, Grain::Monthly);
    stage("yearly rollup", 8);
    let yearly = rollup(&daily, Grain::Yearly);

    stage("stock aging", 9);
    let stock_aging = metrics::stock_aging(&balances, reference);
    stage("storage days", 10);
    let storage_day = metrics::storage_days(&balances);

    LedgerTables {
        daily,
        weekly,
        monthly,
        yearly,
        stock_aging,
        storage_day,
    }
}
