//! Defensive conservation checks between the daily ledger and its rollups.
//!
//! A rollup is a pure re-bucketing of the daily ledger; if flow totals ever
//! disagree, that is a programming bug, not a data issue, and it surfaces as
//! a fatal error rather than being silently tolerated.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{Direction, LedgerRow, RollupRow};

use super::rollup::Grain;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "{grain} rollup loses flow volume for {owner_code}/{item_code} {direction}: \
         daily total {daily_total}, rollup total {rollup_total}"
    )]
    RollupMismatch {
        grain: &'static str,
        owner_code: String,
        item_code: String,
        direction: &'static str,
        daily_total: f64,
        rollup_total: f64,
    },
}

/// Relative tolerance for comparing f64 sums accumulated in different orders.
const REL_TOLERANCE: f64 = 1e-9;

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn flow_totals<'a, I>(rows: I) -> BTreeMap<(String, String, Direction), f64>
where
    I: Iterator<Item = (&'a String, &'a String, Direction, f64)>,
{
    let mut totals = BTreeMap::new();
    for (owner, item, direction, quantity) in rows {
        if direction.is_flow() {
            *totals
                .entry((owner.clone(), item.clone(), direction))
                .or_insert(0.0) += quantity;
        }
    }
    totals
}

/// Check that per-(owner, item, direction) flow totals in a rollup equal the
/// daily ledger's. Levels are excluded — take-latest is not conserved by
/// construction.
pub fn verify_rollups(
    daily: &[LedgerRow],
    rolled: &[RollupRow],
    grain: Grain,
) -> Result<(), PipelineError> {
    let daily_totals = flow_totals(
        daily
            .iter()
            .map(|r| (&r.owner_code, &r.item_code, r.direction, r.quantity)),
    );
    let rollup_totals = flow_totals(
        rolled
            .iter()
            .map(|r| (&r.owner_code, &r.item_code, r.direction, r.quantity)),
    );

    for (key, daily_total) in &daily_totals {
        let rollup_total = rollup_totals.get(key).copied().unwrap_or(0.0);
        if !close_enough(*daily_total, rollup_total) {
            return Err(PipelineError::RollupMismatch {
                grain: grain.as_str(),
                owner_code: key.0.clone(),
                item_code: key.1.clone(),
                direction: key.2.as_str(),
                daily_total: *daily_total,
                rollup_total,
            });
        }
    }
    // A key present only in the rollup would also be a bug.
    for (key, rollup_total) in &rollup_totals {
        if !daily_totals.contains_key(key) && !close_enough(*rollup_total, 0.0) {
            return Err(PipelineError::RollupMismatch {
                grain: grain.as_str(),
                owner_code: key.0.clone(),
                item_code: key.1.clone(),
                direction: key.2.as_str(),
                daily_total: 0.0,
                rollup_total: *rollup_total,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Descriptives;
    use chrono::NaiveDate;

    fn desc() -> Descriptives {
        Descriptives {
            owner_name: "Acme".into(),
            item_name: "Widget".into(),
            uom: "PCS".into(),
            destination_code: "D01".into(),
            destination_name: "Central".into(),
        }
    }

    fn ledger_row(day: u32, direction: Direction, qty: f64) -> LedgerRow {
        LedgerRow {
            owner_code: "O1".into(),
            item_code: "I1".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            direction,
            quantity: qty,
            desc: desc(),
        }
    }

    #[test]
    fn consistent_rollup_passes() {
        let daily = vec![
            ledger_row(8, Direction::In, 10.0),
            ledger_row(9, Direction::In, 5.0),
        ];
        let rolled = crate::pipeline::rollup::rollup(&daily, Grain::Monthly);
        assert!(verify_rollups(&daily, &rolled, Grain::Monthly).is_ok());
    }

    #[test]
    fn tampered_rollup_fails() {
        let daily = vec![ledger_row(8, Direction::In, 10.0)];
        let mut rolled = crate::pipeline::rollup::rollup(&daily, Grain::Monthly);
        rolled[0].quantity += 1.0;

        let err = verify_rollups(&daily, &rolled, Grain::Monthly).unwrap_err();
        assert!(err.to_string().contains("monthly"));
        assert!(err.to_string().contains("O1/I1"));
    }

    #[test]
    fn level_rows_are_exempt() {
        // Stock takes-latest, so its totals differ legitimately.
        let daily = vec![
            ledger_row(8, Direction::Stock, 100.0),
            ledger_row(9, Direction::Stock, 100.0),
        ];
        let rolled = crate::pipeline::rollup::rollup(&daily, Grain::Monthly);
        assert!(verify_rollups(&daily, &rolled, Grain::Monthly).is_ok());
    }
}
