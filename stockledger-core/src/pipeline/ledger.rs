//! Unified daily ledger — flows and levels on one dense per-day table.
//!
//! The ledger unions three sources keyed on (owner, item, date, direction):
//! aggregated In/Out movements, the densified daily stock series, and
//! zero-quantity In/Out placeholders for every densified day. Placeholders
//! make the table dense in direction coverage, so downstream rollups report
//! zero rather than nothing for no-movement periods.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{
    AggregatedMovement, DailyBalanceRow, Descriptives, Direction, LedgerRow, StockSnapshot,
};

type Key = (String, String, NaiveDate, Direction);

struct Acc {
    quantity: f64,
    desc: Option<Descriptives>,
}

fn add(groups: &mut BTreeMap<Key, Acc>, key: Key, quantity: f64, desc: &Descriptives) {
    let acc = groups.entry(key).or_insert(Acc {
        quantity: 0.0,
        desc: None,
    });
    acc.quantity += quantity;
    if acc.desc.is_none() {
        acc.desc = Some(desc.clone());
    }
}

/// Build the daily ledger from aggregated flows and the densified stock
/// series. Output is sorted by (owner, item, date, direction).
pub fn build_ledger(
    aggregated: &[AggregatedMovement],
    daily_stock: &[StockSnapshot],
) -> Vec<LedgerRow> {
    let mut groups: BTreeMap<Key, Acc> = BTreeMap::new();

    // Actual flows first so their descriptives win over placeholders.
    for movement in aggregated {
        add(
            &mut groups,
            (
                movement.owner_code.clone(),
                movement.item_code.clone(),
                movement.date,
                movement.direction,
            ),
            movement.quantity,
            &movement.desc,
        );
    }

    for snap in daily_stock {
        add(
            &mut groups,
            (
                snap.owner_code.clone(),
                snap.item_code.clone(),
                snap.date,
                Direction::Stock,
            ),
            snap.quantity,
            &snap.desc,
        );
        // Zero placeholders keep every densified day dense in direction.
        for flow in [Direction::In, Direction::Out] {
            add(
                &mut groups,
                (snap.owner_code.clone(), snap.item_code.clone(), snap.date, flow),
                0.0,
                &snap.desc,
            );
        }
    }

    groups
        .into_iter()
        .map(|((owner_code, item_code, date, direction), acc)| LedgerRow {
            owner_code,
            item_code,
            date,
            direction,
            quantity: acc.quantity,
            desc: acc.desc.unwrap_or_else(|| Descriptives {
                owner_name: String::new(),
                item_name: String::new(),
                uom: String::new(),
                destination_code: String::new(),
                destination_name: String::new(),
            }),
        })
        .collect()
}

/// Pivot the long ledger into one wide row per (owner, item, date).
///
/// Requires `ledger` sorted by (owner, item, date, direction), which
/// `build_ledger` guarantees.
pub fn daily_balances(ledger: &[LedgerRow]) -> Vec<DailyBalanceRow> {
    let mut balances: Vec<DailyBalanceRow> = Vec::new();

    for row in ledger {
        let same_day = balances.last().map(|b| {
            b.owner_code == row.owner_code && b.item_code == row.item_code && b.date == row.date
        });
        if same_day != Some(true) {
            balances.push(DailyBalanceRow {
                owner_code: row.owner_code.clone(),
                item_code: row.item_code.clone(),
                date: row.date,
                stock_qty: 0.0,
                in_qty: 0.0,
                out_qty: 0.0,
                desc: row.desc.clone(),
            });
        }
        let balance = balances.last_mut().expect("just pushed");
        match row.direction {
            Direction::In => balance.in_qty += row.quantity,
            Direction::Out => balance.out_qty += row.quantity,
            Direction::Stock => balance.stock_qty = row.quantity,
        }
    }
    balances
}
