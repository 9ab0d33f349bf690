//! Stock aging and storage-duration metrics over the daily balances.

use chrono::NaiveDate;

use crate::domain::{AgingRow, DailyBalanceRow, StorageDayRow};

/// Annotate each daily balance with its age in whole days relative to
/// `reference`. Negative ages (balances dated after the reference) clamp
/// to zero.
pub fn stock_aging(balances: &[DailyBalanceRow], reference: NaiveDate) -> Vec<AgingRow> {
    balances
        .iter()
        .map(|balance| AgingRow {
            balance: balance.clone(),
            age_days: (reference - balance.date).num_days().max(0),
        })
        .collect()
}

/// Annotate each daily balance with the days-of-supply point estimate:
/// stock / (in + out) when the day's movement is strictly positive,
/// undefined otherwise. Computed independently per row — no smoothing.
pub fn storage_days(balances: &[DailyBalanceRow]) -> Vec<StorageDayRow> {
    balances
        .iter()
        .map(|balance| {
            let movement = balance.in_qty + balance.out_qty;
            let storage_days = if movement > 0.0 {
                Some(balance.stock_qty / movement)
            } else {
                None
            };
            StorageDayRow {
                balance: balance.clone(),
                movement,
                storage_days,
            }
        })
        .collect()
}
