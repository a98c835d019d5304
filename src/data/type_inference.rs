//! Column type inference from a payload's first record
//!
//! The first record decides every column's type for the rest of the stream.
//! Later records are coerced into that layout by the row builder, which
//! shares the parsers used here.

use crate::data::record::Attribute;
use crate::data::schema::{ColumnType, Schema};
use crate::data::value_parsing::{parse_float_strict, parse_timestamp};
use tracing::{debug, info};

/// Type inference utilities
pub struct TypeInference;

impl TypeInference {
    /// Classify a single raw attribute value.
    ///
    /// Order of checks matters: anything the numeric parser consumes whole is
    /// Numeric, so a bare year like "2023" is never read as a date.
    pub fn infer_from_string(value: &str) -> ColumnType {
        if parse_float_strict(value).is_some() {
            return ColumnType::Numeric;
        }

        if parse_timestamp(value).is_some() {
            return ColumnType::Timestamp;
        }

        ColumnType::Text
    }

    /// Build the schema for a stream from its first record's attributes.
    ///
    /// Columns keep the attribute order. A repeated attribute name keeps the
    /// type of its first occurrence.
    pub fn infer_schema(attributes: &[Attribute]) -> Schema {
        let mut schema = Schema::new();

        for attr in attributes {
            let column_type = Self::infer_from_string(&attr.value);
            if !schema.push(attr.name.as_str(), column_type) {
                debug!(target: "type_inference", "{} repeated on first record, keeping first", attr.name);
                continue;
            }

            match column_type {
                ColumnType::Numeric => {
                    info!(target: "type_inference", "{} is a double ({})", attr.name, attr.value)
                }
                ColumnType::Timestamp => info!(
                    target: "type_inference",
                    "{} is a time ({})",
                    attr.name,
                    parse_timestamp(&attr.value).unwrap_or_default()
                ),
                ColumnType::Text => {
                    info!(target: "type_inference", "{} is a string ({})", attr.name, attr.value)
                }
            }
        }

        schema
    }
}
