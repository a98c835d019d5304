//! Streams records into a columnar table using a fixed schema

use crate::data::columnar_table::ColumnarTable;
use crate::data::record::Record;
use crate::data::row_builder::{CellWrite, MissingAttributePolicy, RowBuilder};
use crate::data::schema::Schema;
use crate::error::StreamError;
use tracing::{debug, trace};

/// Counters collected while populating one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateStats {
    pub rows: usize,
    /// Attributes whose name is not in the schema
    pub ignored_attributes: usize,
    /// Values that did not match their column type and were replaced
    pub substituted_values: usize,
}

pub struct ColumnarPopulator {
    policy: MissingAttributePolicy,
}

impl Default for ColumnarPopulator {
    fn default() -> Self {
        Self::new(MissingAttributePolicy::default())
    }
}

impl ColumnarPopulator {
    pub fn new(policy: MissingAttributePolicy) -> Self {
        Self { policy }
    }

    /// Fill `table` with every record, including the one the schema came from.
    ///
    /// Returns the number of committed rows. A record that cannot be read ends
    /// the stream with that error; rows committed before it stay in `table`.
    pub fn populate<I>(
        &self,
        table: &mut ColumnarTable,
        schema: &Schema,
        records: I,
    ) -> Result<usize, StreamError>
    where
        I: IntoIterator<Item = Result<Record, StreamError>>,
    {
        self.populate_with_stats(table, schema, records)
            .map(|stats| stats.rows)
    }

    pub fn populate_with_stats<I>(
        &self,
        table: &mut ColumnarTable,
        schema: &Schema,
        records: I,
    ) -> Result<PopulateStats, StreamError>
    where
        I: IntoIterator<Item = Result<Record, StreamError>>,
    {
        let mut builder = RowBuilder::new(schema, self.policy);
        let mut stats = PopulateStats::default();

        for record in records {
            let record = record?;

            for attr in &record.attributes {
                let Some(ordinal) = schema.ordinal_of(&attr.name) else {
                    trace!(
                        target: "populator",
                        "row {}: {} not in schema, ignored",
                        stats.rows,
                        attr.name
                    );
                    stats.ignored_attributes += 1;
                    continue;
                };

                if builder.set_cell(ordinal, &attr.value) == CellWrite::Substituted {
                    trace!(
                        target: "populator",
                        "row {}: '{}' is not a valid {} for {}",
                        stats.rows,
                        attr.value,
                        schema.get(ordinal).map(|e| e.column_type.as_str()).unwrap_or("value"),
                        attr.name
                    );
                    stats.substituted_values += 1;
                }
            }

            builder
                .commit(table)
                .map_err(|source| StreamError::Populate {
                    payload: table.name.clone(),
                    source,
                })?;
            stats.rows += 1;
        }

        debug!(
            target: "populator",
            "{}: {} rows, {} ignored attributes, {} substituted values",
            table.name,
            stats.rows,
            stats.ignored_attributes,
            stats.substituted_values
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columnar_table::Cell;
    use crate::data::type_inference::TypeInference;

    fn ok_records(records: Vec<Record>) -> Vec<Result<Record, StreamError>> {
        records.into_iter().map(Ok).collect()
    }

    fn scenario_records() -> Vec<Record> {
        vec![
            Record::new("GpsResult")
                .with_attribute("x", "1.5")
                .with_attribute("t", "2024-01-01T00:00:00.500")
                .with_attribute("s", "hello"),
            Record::new("GpsResult")
                .with_attribute("x", "2.5")
                .with_attribute("t", "2024-01-01T00:00:01.000")
                .with_attribute("s", "world"),
        ]
    }

    #[test]
    fn test_populate_scenario() {
        let records = scenario_records();
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("A", &schema);

        let rows = ColumnarPopulator::default()
            .populate(&mut table, &schema, ok_records(records))
            .unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            table.row_as_strings(0).unwrap(),
            vec!["1.5", "1704067200.5", "hello"]
        );
        assert_eq!(table.value_by_name(1, "x"), Some(Cell::Number(2.5)));
        assert_eq!(
            table.value_by_name(1, "t"),
            Some(Cell::Number(1_704_067_201.0))
        );
        assert_eq!(
            table.value_by_name(1, "s"),
            Some(Cell::Text("world".to_string()))
        );
    }

    #[test]
    fn test_missing_attribute_reuses_previous_value() {
        let mut records = scenario_records();
        records[1] = Record::new("GpsResult")
            .with_attribute("x", "2.5")
            .with_attribute("t", "2024-01-01T00:00:01.000");
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("A", &schema);

        ColumnarPopulator::default()
            .populate(&mut table, &schema, ok_records(records))
            .unwrap();

        assert_eq!(
            table.value_by_name(1, "s"),
            Some(Cell::Text("hello".to_string()))
        );
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let mut records = scenario_records();
        records[1] = records[1].clone().with_attribute("extra", "99");
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("A", &schema);

        let stats = ColumnarPopulator::default()
            .populate_with_stats(&mut table, &schema, ok_records(records))
            .unwrap();

        assert_eq!(stats.rows, 2);
        assert_eq!(stats.ignored_attributes, 1);
        assert_eq!(table.column_count(), 3);
        assert!(table.column("extra").is_none());
        assert_eq!(table.value_by_name(1, "x"), Some(Cell::Number(2.5)));
    }

    #[test]
    fn test_type_mismatches_degrade() {
        let records = vec![
            Record::new("r")
                .with_attribute("x", "1")
                .with_attribute("t", "2024-06-01T12:00:00")
                .with_attribute("s", "a"),
            Record::new("r")
                .with_attribute("x", "n/a")
                .with_attribute("t", "unknown")
                .with_attribute("s", "42"),
            Record::new("r")
                .with_attribute("x", "7.25m")
                .with_attribute("t", "2024-06-01T12:00:01")
                .with_attribute("s", ""),
        ];
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("r", &schema);

        let stats = ColumnarPopulator::default()
            .populate_with_stats(&mut table, &schema, ok_records(records))
            .unwrap();

        assert_eq!(stats.rows, 3);
        assert_eq!(stats.substituted_values, 3);
        assert_eq!(table.value_by_name(1, "x"), Some(Cell::Number(0.0)));
        assert_eq!(table.value_by_name(1, "t"), Some(Cell::Number(-1.0)));
        assert_eq!(
            table.value_by_name(1, "s"),
            Some(Cell::Text("42".to_string()))
        );
        assert_eq!(table.value_by_name(2, "x"), Some(Cell::Number(7.25)));
        assert_eq!(table.value_by_name(2, "s"), Some(Cell::Text(String::new())));
    }

    #[test]
    fn test_reset_policy_blanks_missing_attributes() {
        let mut records = scenario_records();
        records[1] = Record::new("GpsResult").with_attribute("x", "2.5");
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("A", &schema);

        ColumnarPopulator::new(MissingAttributePolicy::Reset)
            .populate(&mut table, &schema, ok_records(records))
            .unwrap();

        assert_eq!(table.value_by_name(1, "s"), Some(Cell::Text(String::new())));
        let t = table.value_by_name(1, "t").and_then(|c| c.as_f64()).unwrap();
        assert!(t.is_nan());
    }

    #[test]
    fn test_record_error_stops_the_stream() {
        let records = scenario_records();
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let mut table = ColumnarTable::from_schema("A", &schema);

        let input = vec![
            Ok(records[0].clone()),
            Err(StreamError::Xml {
                payload: "A".to_string(),
                reason: "unexpected end of input".to_string(),
            }),
            Ok(records[1].clone()),
        ];

        let result = ColumnarPopulator::default().populate(&mut table, &schema, input);

        assert!(matches!(result, Err(StreamError::Xml { .. })));
        assert_eq!(table.row_count(), 1);
    }
}
