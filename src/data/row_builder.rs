//! Reusable row buffer between records and the columnar table
//!
//! One slot per schema column, allocated once per stream and overwritten for
//! every record. The coercion function for each slot is chosen when the
//! builder is created, so rows never re-inspect column types.

use crate::data::columnar_table::{Cell, ColumnarTable};
use crate::data::schema::{ColumnType, Schema};
use crate::data::value_parsing::{parse_float_prefix, parse_timestamp, TIMESTAMP_SENTINEL};
use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an unset slot holds when the next row is committed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAttributePolicy {
    /// Keep the value from the previous row.
    ///
    /// Records that omit an attribute repeat the last value seen for it. This
    /// matches how existing MWX conversions behave; it has not been confirmed
    /// against real sparse data.
    #[default]
    CarryForward,
    /// Put the slot back to its initial value after every commit
    /// (NaN for double storage, empty string for text)
    Reset,
}

impl MissingAttributePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingAttributePolicy::CarryForward => "carry_forward",
            MissingAttributePolicy::Reset => "reset",
        }
    }
}

impl fmt::Display for MissingAttributePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingAttributePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "carry_forward" => Ok(MissingAttributePolicy::CarryForward),
            "reset" => Ok(MissingAttributePolicy::Reset),
            other => Err(format!(
                "unknown missing-attribute policy '{}' (expected carry-forward or reset)",
                other
            )),
        }
    }
}

/// Result of converting raw text for a slot
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// The text matched the column type
    Exact(Cell),
    /// The text did not match; a fallback value was produced
    Substituted(Cell),
}

/// Outcome of `RowBuilder::set_cell`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellWrite {
    Exact,
    Substituted,
    /// Ordinal outside the schema, nothing written
    Ignored,
}

pub type CoerceFn = fn(&str) -> Coercion;

/// strtod semantics: whatever prefix parses is kept, 0.0 when nothing does
fn coerce_numeric(raw: &str) -> Coercion {
    let (value, consumed) = parse_float_prefix(raw);
    if consumed == raw.len() {
        Coercion::Exact(Cell::Number(value))
    } else {
        Coercion::Substituted(Cell::Number(value))
    }
}

fn coerce_timestamp(raw: &str) -> Coercion {
    match parse_timestamp(raw) {
        Some(seconds) => Coercion::Exact(Cell::Number(seconds)),
        None => Coercion::Substituted(Cell::Number(TIMESTAMP_SENTINEL)),
    }
}

fn coerce_text(raw: &str) -> Coercion {
    Coercion::Exact(Cell::Text(raw.to_string()))
}

/// Pick the coercion for a column type
pub fn coercion_for(column_type: ColumnType) -> CoerceFn {
    match column_type {
        ColumnType::Numeric => coerce_numeric,
        ColumnType::Timestamp => coerce_timestamp,
        ColumnType::Text => coerce_text,
    }
}

pub struct RowBuilder {
    slots: Vec<Cell>,
    initial: Vec<Cell>,
    coercers: Vec<CoerceFn>,
    policy: MissingAttributePolicy,
}

impl RowBuilder {
    pub fn new(schema: &Schema, policy: MissingAttributePolicy) -> Self {
        let initial: Vec<Cell> = schema
            .iter()
            .map(|entry| match (policy, entry.column_type.is_numeric_storage()) {
                (MissingAttributePolicy::Reset, true) => Cell::Number(f64::NAN),
                _ => Cell::empty_for(entry.column_type),
            })
            .collect();
        let coercers = schema
            .iter()
            .map(|entry| coercion_for(entry.column_type))
            .collect();

        Self {
            slots: initial.clone(),
            initial,
            coercers,
            policy,
        }
    }

    /// Convert `raw` with the slot's coercion and store it
    pub fn set_cell(&mut self, ordinal: usize, raw: &str) -> CellWrite {
        let Some(coerce) = self.coercers.get(ordinal) else {
            return CellWrite::Ignored;
        };

        match coerce(raw) {
            Coercion::Exact(cell) => {
                self.slots[ordinal] = cell;
                CellWrite::Exact
            }
            Coercion::Substituted(cell) => {
                self.slots[ordinal] = cell;
                CellWrite::Substituted
            }
        }
    }

    pub fn current(&self, ordinal: usize) -> Option<&Cell> {
        self.slots.get(ordinal)
    }

    pub fn policy(&self) -> MissingAttributePolicy {
        self.policy
    }

    /// Append the current slot values to `table` as one row.
    ///
    /// All `set_cell` calls for a record must happen before this; slots left
    /// unset hold whatever the policy dictates.
    pub fn commit(&mut self, table: &mut ColumnarTable) -> Result<(), TableError> {
        table.append_row(&self.slots)?;
        if self.policy == MissingAttributePolicy::Reset {
            self.slots.clone_from(&self.initial);
        }
        Ok(())
    }
}
