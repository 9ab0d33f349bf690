//! Multi-grain rollups — one parameterized engine for week/month/year.
//!
//! All three grains share one aggregation path with the bucket function as
//! the strategy parameter. Flows (In/Out) sum across a bucket. The Stock
//! level takes the chronologically-latest daily value inside the bucket —
//! a balance is a level, not a flow, and summing it would overstate stock
//! by a factor of the bucket length.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::{month_start, week_start, year_start};
use crate::domain::{Descriptives, Direction, LedgerRow, RollupRow};

/// Rollup granularity. Each grain maps a date to its bucket-start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grain {
    Weekly,
    Monthly,
    Yearly,
}

impl Grain {
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Grain::Weekly => week_start(date),
            Grain::Monthly => month_start(date),
            Grain::Yearly => year_start(date),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grain::Weekly => "weekly",
            Grain::Monthly => "monthly",
            Grain::Yearly => "yearly",
        }
    }
}

struct Acc {
    quantity: f64,
    latest_source_date: NaiveDate,
    desc: Descriptives,
}

/// Re-bucket the daily ledger at the given grain.
///
/// Input must be the daily ledger (never raw movements), sorted by
/// (owner, item, date, direction) as `build_ledger` produces it.
/// Descriptives are first-wins, i.e. from the earliest day in the bucket.
pub fn rollup(ledger: &[LedgerRow], grain: Grain) -> Vec<RollupRow> {
    let mut buckets: BTreeMap<(String, String, NaiveDate, Direction), Acc> = BTreeMap::new();

    for row in ledger {
        let key = (
            row.owner_code.clone(),
            row.item_code.clone(),
            grain.bucket_start(row.date),
            row.direction,
        );
        match buckets.get_mut(&key) {
            Some(acc) => {
                if row.direction.is_level() {
                    // Levels: latest value in the bucket wins.
                    if row.date > acc.latest_source_date {
                        acc.quantity = row.quantity;
                        acc.latest_source_date = row.date;
                    }
                } else {
                    acc.quantity += row.quantity;
                }
            }
            None => {
                buckets.insert(
                    key,
                    Acc {
                        quantity: row.quantity,
                        latest_source_date: row.date,
                        desc: row.desc.clone(),
                    },
                );
            }
        }
    }

    buckets
        .into_iter()
        .map(|((owner_code, item_code, bucket_start, direction), acc)| RollupRow {
            owner_code,
            item_code,
            bucket_start,
            direction,
            quantity: acc.quantity,
            desc: acc.desc,
        })
        .collect()
}
