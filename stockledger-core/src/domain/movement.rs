//! Movement records and point-in-time snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a ledger fact.
///
/// `In` and `Out` are flows (quantities moved on a date). `Stock` is a level:
/// a balance snapshot, not a flow. The distinction drives rollup semantics —
/// flows sum across a bucket, levels take the chronologically-latest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    Stock,
}

impl Direction {
    /// True for `Stock` (a balance level), false for the two flows.
    pub fn is_level(self) -> bool {
        matches!(self, Direction::Stock)
    }

    pub fn is_flow(self) -> bool {
        !self.is_level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "In",
            Direction::Out => "Out",
            Direction::Stock => "Stock",
        }
    }
}

/// Descriptive attributes carried alongside every aggregation.
///
/// These are "first observed" per group, never validated for consistency
/// across duplicates — callers must tolerate that data-quality gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptives {
    pub owner_name: String,
    pub item_name: String,
    pub uom: String,
    pub destination_code: String,
    pub destination_name: String,
}

/// One normalized stock movement event.
///
/// `quantity` is always a non-negative magnitude; `direction` carries the
/// sign semantics. `seq` is the stable input-order index (file order, then
/// row order) that makes every "first-wins" merge deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub seq: u64,
    pub date: NaiveDate,
    pub direction: Direction,
    pub owner_code: String,
    pub item_code: String,
    pub quantity: f64,
    /// On-hand quantity reported by the source system at event time.
    /// Retained on the canonical record but not used by the derivation.
    pub inventory_qty: f64,
    pub desc: Descriptives,
}

/// Net movement per (owner, item, date, direction).
///
/// `first_seq` is the smallest input-order index of the collapsed rows; it
/// pins which duplicate's descriptive fields won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMovement {
    pub owner_code: String,
    pub item_code: String,
    pub date: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
    pub first_seq: u64,
    pub desc: Descriptives,
}

/// Cumulative stock balance for an (owner, item) as of a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub owner_code: String,
    pub item_code: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub first_seq: u64,
    pub desc: Descriptives,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_desc() -> Descriptives {
        Descriptives {
            owner_name: "Acme Logistics".into(),
            item_name: "Widget A".into(),
            uom: "PCS".into(),
            destination_code: "D01".into(),
            destination_name: "Central DC".into(),
        }
    }

    #[test]
    fn direction_level_vs_flow() {
        assert!(Direction::Stock.is_level());
        assert!(!Direction::Stock.is_flow());
        assert!(Direction::In.is_flow());
        assert!(Direction::Out.is_flow());
    }

    #[test]
    fn direction_ordering_puts_flows_before_stock() {
        // BTreeMap keys rely on this: In < Out < Stock
        assert!(Direction::In < Direction::Out);
        assert!(Direction::Out < Direction::Stock);
    }

    #[test]
    fn movement_record_serialization_roundtrip() {
        let rec = MovementRecord {
            seq: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            direction: Direction::In,
            owner_code: "O1".into(),
            item_code: "I1".into(),
            quantity: 100.0,
            inventory_qty: 250.0,
            desc: sample_desc(),
        };
        let json = serde_json::to_string(&rec).unwrap();
        let deser: MovementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, deser);
    }
}
