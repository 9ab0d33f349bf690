//! Required column contract and the data-driven header alias table.
//!
//! Extract headers vary across source systems: BOM prefixes, stray
//! whitespace, casing, and spelling drift. Headers are normalized first,
//! then looked up in an alias table that maps known variant spellings to
//! the canonical columns. The table ships with built-in defaults and can be
//! extended from TOML so new variants are data, not code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The canonical columns every movement extract must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    OperationDate,
    RcvSoFlag,
    OwnerCode,
    OwnerName,
    ItemCode,
    ItemName,
    Quantity,
    Uom,
    InventoryQty,
    DestinationCode,
    DestinationName,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::OperationDate,
        Column::RcvSoFlag,
        Column::OwnerCode,
        Column::OwnerName,
        Column::ItemCode,
        Column::ItemName,
        Column::Quantity,
        Column::Uom,
        Column::InventoryQty,
        Column::DestinationCode,
        Column::DestinationName,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Column::OperationDate => "operation_date",
            Column::RcvSoFlag => "rcv_so_flag",
            Column::OwnerCode => "owner_code",
            Column::OwnerName => "owner_name",
            Column::ItemCode => "item_code",
            Column::ItemName => "item_name",
            Column::Quantity => "quantity",
            Column::Uom => "uom",
            Column::InventoryQty => "inventory_qty",
            Column::DestinationCode => "destination_code",
            Column::DestinationName => "destination_name",
        }
    }
}

/// Normalize a raw header cell: strip a leading BOM, trim, collapse internal
/// whitespace runs to single spaces, lowercase.
pub fn normalize_header(raw: &str) -> String {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("invalid alias table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Header alias table: normalized variant spelling → canonical column.
///
/// Serializes as a flat map. Deserializing merges the entries into the
/// built-in defaults (user spellings win on collision), so a config file
/// only ever lists its additions.
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    aliases: BTreeMap<String, Column>,
}

impl Serialize for ColumnAliases {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.aliases.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnAliases {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let user = BTreeMap::<String, Column>::deserialize(deserializer)?;
        let mut table = ColumnAliases::default();
        for (spelling, column) in user {
            table.aliases.insert(normalize_header(&spelling), column);
        }
        Ok(table)
    }
}

impl ColumnAliases {
    /// Resolve a raw header cell to a canonical column, if known.
    pub fn resolve(&self, raw_header: &str) -> Option<Column> {
        self.aliases.get(&normalize_header(raw_header)).copied()
    }

    /// Extend the built-in table with entries from a TOML document of the form:
    ///
    /// ```toml
    /// [aliases]
    /// "op. date" = "operation_date"
    /// "qty" = "quantity"
    /// ```
    ///
    /// User entries win over built-ins on collision.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AliasError> {
        #[derive(Deserialize)]
        struct AliasFile {
            aliases: ColumnAliases,
        }
        let file: AliasFile = toml::from_str(toml_str)?;
        Ok(file.aliases)
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let entries: &[(&str, Column)] = &[
            ("operation date", Column::OperationDate),
            ("operation_date", Column::OperationDate),
            ("op date", Column::OperationDate),
            ("rcv so flag", Column::RcvSoFlag),
            ("rcv_so_flag", Column::RcvSoFlag),
            ("rcv/so flag", Column::RcvSoFlag),
            ("owner code", Column::OwnerCode),
            ("owner_code", Column::OwnerCode),
            ("owner name", Column::OwnerName),
            ("owner_name", Column::OwnerName),
            ("item code", Column::ItemCode),
            ("item_code", Column::ItemCode),
            ("item name", Column::ItemName),
            ("item_name", Column::ItemName),
            ("quantity[unit1]", Column::Quantity),
            ("quantity [unit1]", Column::Quantity),
            ("quantity", Column::Quantity),
            ("qty[unit1]", Column::Quantity),
            ("uom1", Column::Uom),
            ("uom", Column::Uom),
            ("inventory qty", Column::InventoryQty),
            ("inventory_qty", Column::InventoryQty),
            ("inventory quantity", Column::InventoryQty),
            ("delivery destination code", Column::DestinationCode),
            ("destination code", Column::DestinationCode),
            ("destination_code", Column::DestinationCode),
            ("delivery destination name", Column::DestinationName),
            ("destination name", Column::DestinationName),
            ("destination_name", Column::DestinationName),
        ];
        let aliases = entries
            .iter()
            .map(|(spelling, column)| (spelling.to_string(), *column))
            .collect();
        ColumnAliases { aliases }
    }
}
