//! Ledger, rollup, and metric row types — the pipeline's output tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::movement::{Descriptives, Direction};

/// One row of the unified daily ledger (the Daily Transaction table).
///
/// Dense in both senses: every calendar day of an (owner, item)'s densified
/// span has a `Stock` row plus `In` and `Out` rows, zero-filled when no
/// movement occurred that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub owner_code: String,
    pub item_code: String,
    pub date: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
    pub desc: Descriptives,
}

/// Wide per-day pivot of the ledger: one row per (owner, item, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalanceRow {
    pub owner_code: String,
    pub item_code: String,
    pub date: NaiveDate,
    pub stock_qty: f64,
    pub in_qty: f64,
    pub out_qty: f64,
    pub desc: Descriptives,
}

/// One row of a weekly/monthly/yearly rollup.
///
/// `bucket_start` is the first date of the ISO week, calendar month, or
/// calendar year containing the source dates. Flow quantities are sums over
/// the bucket; the `Stock` quantity is the latest daily value in the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRow {
    pub owner_code: String,
    pub item_code: String,
    pub bucket_start: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
    pub desc: Descriptives,
}

/// Daily balance annotated with its age relative to the reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingRow {
    #[serde(flatten)]
    pub balance: DailyBalanceRow,
    /// Whole days between the reference date and the balance date,
    /// clamped at zero for future-dated balances.
    pub age_days: i64,
}

/// Daily balance annotated with the days-of-supply point estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDayRow {
    #[serde(flatten)]
    pub balance: DailyBalanceRow,
    /// Total movement that day (in + out).
    pub movement: f64,
    /// stock / movement when movement > 0; `None` otherwise — never zero
    /// or infinity.
    pub storage_days: Option<f64>,
}
