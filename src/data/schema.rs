//! Column layout inferred from the first record of a payload

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Storage type of a column, fixed for the whole record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// IEEE-754 double
    Numeric,
    /// Seconds since the Unix epoch, stored as a double
    Timestamp,
    /// Raw attribute text
    Text,
}

impl ColumnType {
    /// Numeric and Timestamp columns share double storage
    pub fn is_numeric_storage(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Timestamp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchemaEntry {
    pub name: String,
    pub column_type: ColumnType,
    pub ordinal: usize,
}

/// Ordered column definitions with a name index.
///
/// Ordinals follow the order attributes were first seen, never name order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<ColumnSchemaEntry>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Returns `false` and leaves the schema untouched if the
    /// name is already present.
    pub fn push(&mut self, name: impl Into<String>, column_type: ColumnType) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }

        let ordinal = self.entries.len();
        self.index.insert(name.clone(), ordinal);
        self.entries.push(ColumnSchemaEntry {
            name,
            column_type,
            ordinal,
        });
        true
    }

    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, ordinal: usize) -> Option<&ColumnSchemaEntry> {
        self.entries.get(ordinal)
    }

    pub fn entries(&self) -> &[ColumnSchemaEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSchemaEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}
