//! Per-file CSV ingestion: heterogeneous extracts to canonical records.
//!
//! Row-level policies (the asymmetry is deliberate and load-bearing):
//! - unparseable operation date → row dropped, counted
//! - unrecognized direction flag → row dropped, counted
//! - unparseable quantity → coerced to 0, row kept, counted
//!
//! A file that cannot provide the full required column set is skipped as a
//! whole with a reported reason; the batch continues without it.

use chrono::NaiveDate;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::columns::{Column, ColumnAliases};
use crate::domain::{Descriptives, Direction, MovementRecord};

/// Reasons a whole file was rejected.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unreadable file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("{}: missing required columns: {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("{}: no header row", .path.display())]
    EmptyFile { path: PathBuf },
}

/// Row-level ingestion counters, exposed to the caller for observability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IngestStats {
    pub rows_read: u64,
    pub rows_kept: u64,
    /// Rows dropped because the operation date did not parse.
    pub invalid_date: u64,
    /// Rows dropped because the direction flag was not a known label.
    pub unknown_direction: u64,
    /// Rows kept with quantity coerced to 0 (non-numeric quantity cell).
    pub quantity_coerced: u64,
}

impl IngestStats {
    pub fn absorb(&mut self, other: IngestStats) {
        self.rows_read += other.rows_read;
        self.rows_kept += other.rows_kept;
        self.invalid_date += other.invalid_date;
        self.unknown_direction += other.unknown_direction;
        self.quantity_coerced += other.quantity_coerced;
    }

    pub fn rows_dropped(&self) -> u64 {
        self.invalid_date + self.unknown_direction
    }
}

/// Canonical records read from one file. `seq` on each record is the
/// file-local row index; the batch layer reassigns a global sequence once
/// file order is pinned.
#[derive(Debug)]
pub struct FileRecords {
    pub records: Vec<MovementRecord>,
    pub stats: IngestStats,
}

/// Read one movement extract into canonical records.
pub fn read_movement_file(
    path: &Path,
    aliases: &ColumnAliases,
) -> Result<FileRecords, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(bytes.len());
    let delimiter = sniff_delimiter(&bytes[..header_end]);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let headers = reader
        .byte_headers()
        .map_err(|e| IngestError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .clone();

    // First matching header wins if a file repeats a column.
    let mut index: BTreeMap<Column, usize> = BTreeMap::new();
    for (i, cell) in headers.iter().enumerate() {
        let name = String::from_utf8_lossy(cell);
        if let Some(column) = aliases.resolve(&name) {
            index.entry(column).or_insert(i);
        }
    }

    let missing: Vec<String> = Column::ALL
        .iter()
        .filter(|c| !index.contains_key(c))
        .map(|c| c.canonical_name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut stats = IngestStats::default();
    let mut records = Vec::new();

    for row in reader.byte_records() {
        let row = row.map_err(|e| IngestError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        stats.rows_read += 1;

        let field = |column: Column| cell(&row, index[&column]);

        let date = match parse_day_first(&field(Column::OperationDate)) {
            Some(d) => d,
            None => {
                stats.invalid_date += 1;
                continue;
            }
        };
        let direction = match parse_direction(&field(Column::RcvSoFlag)) {
            Some(d) => d,
            None => {
                stats.unknown_direction += 1;
                continue;
            }
        };
        // Magnitude only; the direction carries the sign semantics.
        let quantity = match parse_quantity(&field(Column::Quantity)) {
            Some(q) => q.abs(),
            None => {
                stats.quantity_coerced += 1;
                0.0
            }
        };
        let inventory_qty = parse_quantity(&field(Column::InventoryQty)).unwrap_or(0.0);

        records.push(MovementRecord {
            seq: stats.rows_kept,
            date,
            direction,
            owner_code: field(Column::OwnerCode).trim().to_string(),
            item_code: field(Column::ItemCode).trim().to_string(),
            quantity,
            inventory_qty,
            desc: Descriptives {
                owner_name: field(Column::OwnerName).trim().to_string(),
                item_name: field(Column::ItemName).trim().to_string(),
                uom: field(Column::Uom).trim().to_string(),
                destination_code: field(Column::DestinationCode).trim().to_string(),
                destination_name: field(Column::DestinationName).trim().to_string(),
            },
        });
        stats.rows_kept += 1;
    }

    Ok(FileRecords { records, stats })
}

fn cell<'r>(row: &'r csv::ByteRecord, idx: usize) -> Cow<'r, str> {
    match row.get(idx) {
        Some(bytes) => String::from_utf8_lossy(bytes),
        None => Cow::Borrowed(""),
    }
}

/// Pick the delimiter whose count in the header line is highest.
/// Comma wins ties and empty headers.
fn sniff_delimiter(header_line: &[u8]) -> u8 {
    let candidates = [b',', b';', b'\t'];
    let mut best = b',';
    let mut best_count = 0usize;
    for &cand in &candidates {
        let count = header_line.iter().filter(|&&b| b == cand).count();
        if count > best_count {
            best = cand;
            best_count = count;
        }
    }
    best
}

/// Day-first date parsing, with an ISO fallback.
///
/// Accepts `31/12/2024`, `31-12-2024`, `31.12.2024`, `31/12/24`,
/// `2024-12-31`, and `2024/12/31`; a trailing time component is ignored.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &[
        "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%Y-%m-%d", "%Y/%m/%d",
    ];
    let token = raw.trim().split_whitespace().next()?;
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// Lenient numeric parsing: trims, accepts a decimal comma, rejects
/// non-finite values. Returns `None` for anything else.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|q| q.is_finite())
}

/// Map a source direction flag to a canonical flow direction.
///
/// `Stock` is never produced here — it is a synthetic marker introduced by
/// the snapshot builder.
pub fn parse_direction(raw: &str) -> Option<Direction> {
    match raw.trim().to_lowercase().as_str() {
        "rcv(increase)" | "rcv" | "in" | "receipt" | "receive" => Some(Direction::In),
        // "decrese" is the spelling some source systems actually emit.
        "so(decrese)" | "so(decrease)" | "so" | "out" | "ship" | "shipment" => {
            Some(Direction::Out)
        }
        _ => None,
    }
}
