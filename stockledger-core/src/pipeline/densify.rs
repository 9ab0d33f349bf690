//! Daily densification — forward-fill sparse snapshots into a daily series.
//!
//! Each (owner, item) is expanded over its own first-to-last snapshot span,
//! never a global range. Days before an item's first snapshot are not
//! emitted (no retroactive zero-fill), and a day's value is always the most
//! recent prior snapshot (no look-ahead, no interpolation).

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::domain::StockSnapshot;

/// Expand merged snapshots into one stock row per calendar day per
/// (owner, item). Output is sorted by (owner, item, date).
pub fn densify(snapshots: &[StockSnapshot]) -> Vec<StockSnapshot> {
    // Group per item; BTreeMap keyed by date gives the span and fill order.
    let mut per_item: BTreeMap<(String, String), BTreeMap<NaiveDate, &StockSnapshot>> =
        BTreeMap::new();
    for snap in snapshots {
        per_item
            .entry((snap.owner_code.clone(), snap.item_code.clone()))
            .or_default()
            .insert(snap.date, snap);
    }

    let mut daily = Vec::new();
    for ((_, _), by_date) in per_item {
        let first = match by_date.keys().next() {
            Some(&d) => d,
            None => continue,
        };
        let last = *by_date.keys().next_back().unwrap_or(&first);

        let mut current = by_date[&first];
        let mut day = first;
        while day <= last {
            if let Some(&snap) = by_date.get(&day) {
                current = snap;
            }
            daily.push(StockSnapshot {
                date: day,
                ..(*current).clone()
            });
            day += Duration::days(1);
        }
    }
    daily
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Descriptives;

    fn desc(uom: &str) -> Descriptives {
        Descriptives {
            owner_name: "Acme".into(),
            item_name: "Widget".into(),
            uom: uom.into(),
            destination_code: "D01".into(),
            destination_name: "Central".into(),
        }
    }

    fn snap(item: &str, day: u32, qty: f64, uom: &str) -> StockSnapshot {
        StockSnapshot {
            owner_code: "O1".into(),
            item_code: item.into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            quantity: qty,
            first_seq: 0,
            desc: desc(uom),
        }
    }

    #[test]
    fn forward_fills_between_snapshots() {
        let snaps = vec![snap("I1", 5, 100.0, "PCS"), snap("I1", 10, 60.0, "PCS")];
        let daily = densify(&snaps);

        assert_eq!(daily.len(), 6); // Jan 5..=10
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(daily[0].quantity, 100.0);
        assert_eq!(daily[4].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(daily[4].quantity, 100.0); // still the Jan 5 value
        assert_eq!(daily[5].quantity, 60.0);
    }

    #[test]
    fn no_rows_before_first_snapshot() {
        let snaps = vec![snap("I1", 15, 10.0, "PCS")];
        let daily = densify(&snaps);

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn spans_are_per_item_not_global() {
        let snaps = vec![
            snap("I1", 1, 5.0, "PCS"),
            snap("I1", 3, 6.0, "PCS"),
            snap("I2", 10, 9.0, "PCS"),
        ];
        let daily = densify(&snaps);

        let i1_days: Vec<_> = daily.iter().filter(|s| s.item_code == "I1").collect();
        let i2_days: Vec<_> = daily.iter().filter(|s| s.item_code == "I2").collect();
        assert_eq!(i1_days.len(), 3); // Jan 1..=3
        assert_eq!(i2_days.len(), 1); // Jan 10 only; I2 never covers Jan 1..9
    }

    #[test]
    fn fill_carries_the_whole_row_forward() {
        // Descriptives travel with the filled value, like the balance does.
        let snaps = vec![snap("I1", 1, 5.0, "PCS"), snap("I1", 3, 6.0, "BOX")];
        let daily = densify(&snaps);

        assert_eq!(daily[0].desc.uom, "PCS");
        assert_eq!(daily[1].desc.uom, "PCS"); // filled from Jan 1
        assert_eq!(daily[2].desc.uom, "BOX");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(densify(&[]).is_empty());
    }
}
