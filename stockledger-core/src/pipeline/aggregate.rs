//! Movement aggregation — collapse same-key rows into net quantities.

use std::collections::BTreeMap;

use crate::domain::{AggregatedMovement, Descriptives, Direction, MovementRecord};
use chrono::NaiveDate;

type Key = (String, String, NaiveDate, Direction);

struct Acc {
    quantity: f64,
    first_seq: u64,
    desc: Descriptives,
}

/// Group movement records by (owner, item, date, direction), summing
/// quantities. Descriptive attributes are first-wins by the records' stable
/// input-order index, so the result is deterministic for a pinned input
/// order.
///
/// Output is sorted by key.
pub fn aggregate_movements(records: &[MovementRecord]) -> Vec<AggregatedMovement> {
    let mut groups: BTreeMap<Key, Acc> = BTreeMap::new();

    for rec in records {
        let key = (
            rec.owner_code.clone(),
            rec.item_code.clone(),
            rec.date,
            rec.direction,
        );
        match groups.get_mut(&key) {
            Some(acc) => {
                acc.quantity += rec.quantity;
                if rec.seq < acc.first_seq {
                    acc.first_seq = rec.seq;
                    acc.desc = rec.desc.clone();
                }
            }
            None => {
                groups.insert(
                    key,
                    Acc {
                        quantity: rec.quantity,
                        first_seq: rec.seq,
                        desc: rec.desc.clone(),
                    },
                );
            }
        }
    }

    groups
        .into_iter()
        .map(
            |((owner_code, item_code, date, direction), acc)| AggregatedMovement {
                owner_code,
                item_code,
                date,
                direction,
                quantity: acc.quantity,
                first_seq: acc.first_seq,
                desc: acc.desc,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(owner_name: &str) -> Descriptives {
        Descriptives {
            owner_name: owner_name.into(),
            item_name: "Widget".into(),
            uom: "PCS".into(),
            destination_code: "D01".into(),
            destination_name: "Central".into(),
        }
    }

    fn rec(seq: u64, day: u32, direction: Direction, qty: f64, owner_name: &str) -> MovementRecord {
        MovementRecord {
            seq,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            direction,
            owner_code: "O1".into(),
            item_code: "I1".into(),
            quantity: qty,
            inventory_qty: 0.0,
            desc: desc(owner_name),
        }
    }

    #[test]
    fn sums_quantities_per_key() {
        let records = vec![
            rec(0, 5, Direction::In, 60.0, "Acme"),
            rec(1, 5, Direction::In, 40.0, "Acme"),
            rec(2, 5, Direction::Out, 10.0, "Acme"),
            rec(3, 6, Direction::In, 5.0, "Acme"),
        ];
        let agg = aggregate_movements(&records);

        assert_eq!(agg.len(), 3);
        assert_eq!(agg[0].direction, Direction::In);
        assert_eq!(agg[0].quantity, 100.0);
        assert_eq!(agg[1].direction, Direction::Out);
        assert_eq!(agg[1].quantity, 10.0);
        assert_eq!(agg[2].quantity, 5.0);
    }

    #[test]
    fn descriptives_are_first_wins_by_seq() {
        // Same key, conflicting owner names: the lowest seq wins even when
        // rows arrive out of order.
        let records = vec![
            rec(5, 5, Direction::In, 1.0, "Later Name"),
            rec(2, 5, Direction::In, 1.0, "First Name"),
        ];
        let agg = aggregate_movements(&records);

        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].desc.owner_name, "First Name");
        assert_eq!(agg[0].first_seq, 2);
        assert_eq!(agg[0].quantity, 2.0);
    }

    #[test]
    fn output_is_sorted_by_key() {
        let mut records = vec![
            rec(0, 9, Direction::Out, 1.0, "Acme"),
            rec(1, 3, Direction::In, 1.0, "Acme"),
        ];
        records[0].item_code = "I2".into();
        let agg = aggregate_movements(&records);

        assert_eq!(agg[0].item_code, "I1");
        assert_eq!(agg[1].item_code, "I2");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate_movements(&[]).is_empty());
    }
}
