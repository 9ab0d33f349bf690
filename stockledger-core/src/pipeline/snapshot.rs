//! Point-in-time stock snapshot construction.
//!
//! Two snapshot sources feed the daily ledger:
//! 1. Movement-derived: a running cumulative sum of net movement per
//!    (owner, item), dated at each movement date.
//! 2. Terminal: one balance per (owner, item) with a non-zero cumulative
//!    total, dated at the last day of the latest observed month. The max
//!    date is global across the dataset, not per item.
//!
//! The merge keeps the first value per (owner, item, date); movement-derived
//! snapshots are always merged ahead of terminal ones so a same-day
//! collision resolves deterministically.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::month_end;
use crate::domain::{AggregatedMovement, Descriptives, Direction, StockSnapshot};

struct Net {
    quantity: f64,
    first_seq: u64,
    desc: Descriptives,
}

/// Signed net contribution of an aggregated movement.
fn signed(movement: &AggregatedMovement) -> f64 {
    match movement.direction {
        Direction::In => movement.quantity,
        Direction::Out => -movement.quantity,
        // Aggregated input is flows only; a level row contributes nothing.
        Direction::Stock => 0.0,
    }
}

/// Fold aggregated flows into net movement per (owner, item, date),
/// first-wins descriptives.
fn net_by_date(aggregated: &[AggregatedMovement]) -> BTreeMap<(String, String, NaiveDate), Net> {
    let mut nets: BTreeMap<(String, String, NaiveDate), Net> = BTreeMap::new();
    for movement in aggregated {
        let key = (
            movement.owner_code.clone(),
            movement.item_code.clone(),
            movement.date,
        );
        match nets.get_mut(&key) {
            Some(net) => {
                net.quantity += signed(movement);
                if movement.first_seq < net.first_seq {
                    net.first_seq = movement.first_seq;
                    net.desc = movement.desc.clone();
                }
            }
            None => {
                nets.insert(
                    key,
                    Net {
                        quantity: signed(movement),
                        first_seq: movement.first_seq,
                        desc: movement.desc.clone(),
                    },
                );
            }
        }
    }
    nets
}

/// Running cumulative balance per (owner, item), one snapshot per movement
/// date. Output is sorted by (owner, item, date).
pub fn movement_snapshots(aggregated: &[AggregatedMovement]) -> Vec<StockSnapshot> {
    let nets = net_by_date(aggregated);

    let mut snapshots = Vec::with_capacity(nets.len());
    let mut current_item: Option<(String, String)> = None;
    let mut running = 0.0;

    // BTreeMap iteration is (owner, item, date)-ordered, so the running sum
    // resets exactly at each (owner, item) boundary.
    for ((owner_code, item_code, date), net) in nets {
        let item_key = (owner_code.clone(), item_code.clone());
        if current_item.as_ref() != Some(&item_key) {
            current_item = Some(item_key);
            running = 0.0;
        }
        running += net.quantity;
        snapshots.push(StockSnapshot {
            owner_code,
            item_code,
            date,
            quantity: running,
            first_seq: net.first_seq,
            desc: net.desc,
        });
    }
    snapshots
}

/// The terminal snapshot date: last day of the month containing the latest
/// movement date anywhere in the dataset.
pub fn terminal_snapshot_date(aggregated: &[AggregatedMovement]) -> Option<NaiveDate> {
    aggregated.iter().map(|m| m.date).max().map(month_end)
}

/// One terminal snapshot per (owner, item) whose cumulative net total is
/// non-zero, dated at the global terminal date. Fully depleted items emit
/// nothing here.
pub fn terminal_snapshots(aggregated: &[AggregatedMovement]) -> Vec<StockSnapshot> {
    let Some(date) = terminal_snapshot_date(aggregated) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<(String, String), Net> = BTreeMap::new();
    for movement in aggregated {
        let key = (movement.owner_code.clone(), movement.item_code.clone());
        match totals.get_mut(&key) {
            Some(net) => {
                net.quantity += signed(movement);
                if movement.first_seq < net.first_seq {
                    net.first_seq = movement.first_seq;
                    net.desc = movement.desc.clone();
                }
            }
            None => {
                totals.insert(
                    key,
                    Net {
                        quantity: signed(movement),
                        first_seq: movement.first_seq,
                        desc: movement.desc.clone(),
                    },
                );
            }
        }
    }

    totals
        .into_iter()
        .filter(|(_, net)| net.quantity != 0.0)
        .map(|((owner_code, item_code), net)| StockSnapshot {
            owner_code,
            item_code,
            date,
            quantity: net.quantity,
            first_seq: net.first_seq,
            desc: net.desc,
        })
        .collect()
}

/// Merge the two snapshot sources by (owner, item, date), keeping the first
/// value per key. `movement` entries are inserted before `terminal` entries,
/// so a same-day collision keeps the movement-derived balance.
pub fn merge_snapshots(
    movement: Vec<StockSnapshot>,
    terminal: Vec<StockSnapshot>,
) -> Vec<StockSnapshot> {
    let mut merged: BTreeMap<(String, String, NaiveDate), StockSnapshot> = BTreeMap::new();
    for snap in movement.into_iter().chain(terminal) {
        let key = (snap.owner_code.clone(), snap.item_code.clone(), snap.date);
        merged.entry(key).or_insert(snap);
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> Descriptives {
        Descriptives {
            owner_name: "Acme".into(),
            item_name: "Widget".into(),
            uom: "PCS".into(),
            destination_code: "D01".into(),
            destination_name: "Central".into(),
        }
    }

    fn agg(
        item: &str,
        date: (i32, u32, u32),
        direction: Direction,
        qty: f64,
        first_seq: u64,
    ) -> AggregatedMovement {
        AggregatedMovement {
            owner_code: "O1".into(),
            item_code: item.into(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            direction,
            quantity: qty,
            first_seq,
            desc: desc(),
        }
    }

    #[test]
    fn running_balance_accumulates_net_movement() {
        let aggregated = vec![
            agg("I1", (2024, 1, 5), Direction::In, 100.0, 0),
            agg("I1", (2024, 1, 10), Direction::Out, 40.0, 1),
            agg("I1", (2024, 1, 20), Direction::In, 15.0, 2),
        ];
        let snaps = movement_snapshots(&aggregated);

        assert_eq!(snaps.len(), 3);
        assert_eq!(snaps[0].quantity, 100.0);
        assert_eq!(snaps[1].quantity, 60.0);
        assert_eq!(snaps[2].quantity, 75.0);
    }

    #[test]
    fn running_balance_resets_per_item() {
        let aggregated = vec![
            agg("I1", (2024, 1, 5), Direction::In, 100.0, 0),
            agg("I2", (2024, 1, 6), Direction::In, 7.0, 1),
        ];
        let snaps = movement_snapshots(&aggregated);

        assert_eq!(snaps[0].quantity, 100.0);
        assert_eq!(snaps[1].quantity, 7.0); // not 107
    }

    #[test]
    fn same_day_in_and_out_net_into_one_snapshot() {
        let aggregated = vec![
            agg("I1", (2024, 1, 5), Direction::In, 100.0, 0),
            agg("I1", (2024, 1, 5), Direction::Out, 30.0, 1),
        ];
        let snaps = movement_snapshots(&aggregated);

        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].quantity, 70.0);
    }

    #[test]
    fn terminal_date_is_month_end_of_global_max() {
        let aggregated = vec![
            agg("I1", (2024, 1, 5), Direction::In, 1.0, 0),
            agg("I2", (2024, 3, 12), Direction::In, 1.0, 1),
        ];
        assert_eq!(
            terminal_snapshot_date(&aggregated),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
    }

    #[test]
    fn depleted_items_emit_no_terminal_snapshot() {
        let aggregated = vec![
            agg("I1", (2024, 1, 5), Direction::In, 50.0, 0),
            agg("I1", (2024, 1, 9), Direction::Out, 50.0, 1),
            agg("I2", (2024, 1, 5), Direction::In, 20.0, 2),
        ];
        let terminal = terminal_snapshots(&aggregated);

        assert_eq!(terminal.len(), 1);
        assert_eq!(terminal[0].item_code, "I2");
        assert_eq!(terminal[0].quantity, 20.0);
        assert_eq!(
            terminal[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn merge_keeps_movement_value_on_same_day_collision() {
        // Single movement at month end: the movement snapshot and the
        // terminal snapshot share a date.
        let aggregated = vec![agg("I1", (2024, 1, 31), Direction::In, 80.0, 0)];
        let movement = movement_snapshots(&aggregated);
        let terminal = terminal_snapshots(&aggregated);
        assert_eq!(movement[0].date, terminal[0].date);

        let merged = merge_snapshots(movement, terminal);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 80.0);
    }

    #[test]
    fn empty_dataset_has_no_terminal_date() {
        assert_eq!(terminal_snapshot_date(&[]), None);
        assert!(terminal_snapshots(&[]).is_empty());
    }
}
