//! Pure query functions over the derived tables.
//!
//! Filter selections are explicit parameter objects passed per call; the
//! tables themselves are immutable. Nothing here keeps state between calls.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use stockledger_core::domain::{Direction, RollupRow};

/// Filter over a rollup table. Empty collections mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct RollupFilter {
    /// Restrict to buckets starting in this calendar year.
    pub year: Option<i32>,
    /// Restrict to buckets with `start <= bucket_start <= end`.
    pub bucket_range: Option<(NaiveDate, NaiveDate)>,
    pub owners: Vec<String>,
    pub items: Vec<String>,
    /// Keep only In/Out rows, excluding the Stock level.
    pub flows_only: bool,
}

impl RollupFilter {
    fn matches(&self, row: &RollupRow) -> bool {
        if let Some(year) = self.year {
            if row.bucket_start.year() != year {
                return false;
            }
        }
        if let Some((start, end)) = self.bucket_range {
            if row.bucket_start < start || row.bucket_start > end {
                return false;
            }
        }
        if !self.owners.is_empty() && !self.owners.contains(&row.owner_code) {
            return false;
        }
        if !self.items.is_empty() && !self.items.contains(&row.item_code) {
            return false;
        }
        if self.flows_only && row.direction.is_level() {
            return false;
        }
        true
    }
}

/// Select rollup rows matching the filter, preserving table order.
pub fn filter_rollups<'a>(rows: &'a [RollupRow], filter: &RollupFilter) -> Vec<&'a RollupRow> {
    rows.iter().filter(|row| filter.matches(row)).collect()
}

/// One bar of a flow chart: a bucket/direction pair with its total quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket_start: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
}

/// Collapse filtered rollup rows into a chartable series: flows only,
/// absolute quantities summed per (bucket, direction), sorted by bucket.
pub fn flow_series(rows: &[RollupRow], filter: &RollupFilter) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<(NaiveDate, Direction), f64> = BTreeMap::new();
    for row in rows.iter().filter(|row| filter.matches(row)) {
        if row.direction.is_level() {
            continue;
        }
        *totals.entry((row.bucket_start, row.direction)).or_insert(0.0) +=
            row.quantity.abs();
    }
    totals
        .into_iter()
        .map(|((bucket_start, direction), quantity)| SeriesPoint {
            bucket_start,
            direction,
            quantity,
        })
        .collect()
}
