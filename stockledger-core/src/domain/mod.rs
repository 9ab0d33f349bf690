//! Domain types for the stock ledger pipeline.

pub mod ledger;
pub mod movement;

pub use ledger::{AgingRow, DailyBalanceRow, LedgerRow, RollupRow, StorageDayRow};
pub use movement::{AggregatedMovement, Descriptives, Direction, MovementRecord, StockSnapshot};
