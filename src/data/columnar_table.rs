use crate::data::schema::{ColumnType, Schema};
use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value, either double storage or text storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Initial value for a freshly allocated cell of the given type
    pub fn empty_for(column_type: ColumnType) -> Self {
        if column_type.is_numeric_storage() {
            Cell::Number(0.0)
        } else {
            Cell::Text(String::new())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Typed storage for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float64(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    fn for_type(column_type: ColumnType) -> Self {
        if column_type.is_numeric_storage() {
            ColumnData::Float64(Vec::new())
        } else {
            ColumnData::Text(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float64(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub data: ColumnData,
}

impl TableColumn {
    pub fn get(&self, row: usize) -> Option<Cell> {
        match &self.data {
            ColumnData::Float64(v) => v.get(row).copied().map(Cell::Number),
            ColumnData::Text(v) => v.get(row).cloned().map(Cell::Text),
        }
    }
}

/// In-memory columnar table filled row by row by the populator
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnarTable {
    pub name: String,
    columns: Vec<TableColumn>,
    row_count: usize,
}

impl ColumnarTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Create an empty table with one column per schema entry, in ordinal order
    pub fn from_schema(name: impl Into<String>, schema: &Schema) -> Self {
        let mut table = Self::new(name);
        for entry in schema.iter() {
            table.columns.push(TableColumn {
                name: entry.name.clone(),
                column_type: entry.column_type,
                data: ColumnData::for_type(entry.column_type),
            });
        }
        table
    }

    /// Append one row. Cells are validated before any column is touched so a
    /// rejected row leaves the table unchanged.
    pub fn append_row(&mut self, cells: &[Cell]) -> Result<(), TableError> {
        if cells.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }

        for (column, cell) in self.columns.iter().zip(cells) {
            let matches = matches!(
                (&column.data, cell),
                (ColumnData::Float64(_), Cell::Number(_)) | (ColumnData::Text(_), Cell::Text(_))
            );
            if !matches {
                return Err(TableError::CellKind {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        for (column, cell) in self.columns.iter_mut().zip(cells) {
            match (&mut column.data, cell) {
                (ColumnData::Float64(v), Cell::Number(n)) => v.push(*n),
                (ColumnData::Text(v), Cell::Text(s)) => v.push(s.clone()),
                _ => unreachable!("cell kinds checked above"),
            }
        }

        self.row_count += 1;
        Ok(())
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn value(&self, row: usize, col: usize) -> Option<Cell> {
        self.columns.get(col)?.get(row)
    }

    pub fn value_by_name(&self, row: usize, col_name: &str) -> Option<Cell> {
        self.column(col_name)?.get(row)
    }

    /// Row values rendered as strings, in column order
    pub fn row_as_strings(&self, row: usize) -> Option<Vec<String>> {
        if row >= self.row_count {
            return None;
        }
        self.columns
            .iter()
            .map(|c| c.get(row).map(|cell| cell.to_string()))
            .collect()
    }

    pub fn estimate_memory_size(&self) -> usize {
        let mut size = std::mem::size_of::<Self>();
        for column in &self.columns {
            size += std::mem::size_of::<TableColumn>() + column.name.len();
            size += match &column.data {
                ColumnData::Float64(v) => v.len() * std::mem::size_of::<f64>(),
                ColumnData::Text(v) => v
                    .iter()
                    .map(|s| std::mem::size_of::<String>() + s.len())
                    .sum(),
            };
        }
        size
    }

    /// Generate a debug dump string for display
    pub fn debug_dump(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("ColumnarTable: {}\n", self.name));
        output.push_str(&format!(
            "Rows: {} | Columns: {}\n",
            self.row_count(),
            self.column_count()
        ));

        output.push_str("\nColumns:\n");
        for column in &self.columns {
            output.push_str(&format!("  {} ({})\n", column.name, column.column_type));
        }

        if self.row_count() > 0 {
            let sample_size = 5.min(self.row_count());
            output.push_str(&format!("\nFirst {} rows:\n", sample_size));

            for row_idx in 0..sample_size {
                let values = self.row_as_strings(row_idx).unwrap_or_default();
                output.push_str(&format!("  [{}]: {}\n", row_idx, values.join(", ")));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        let mut schema = Schema::new();
        schema.push("x", ColumnType::Numeric);
        schema.push("t", ColumnType::Timestamp);
        schema.push("s", ColumnType::Text);
        schema
    }

    #[test]
    fn test_table_from_schema() {
        let table = ColumnarTable::from_schema("GpsResults", &sample_schema());

        assert_eq!(table.name, "GpsResults");
        assert_eq!(table.column_names(), vec!["x", "t", "s"]);
        assert_eq!(table.row_count(), 0);
        assert!(matches!(
            table.column("t").unwrap().data,
            ColumnData::Float64(_)
        ));
        assert!(matches!(table.column("s").unwrap().data, ColumnData::Text(_)));
    }

    #[test]
    fn test_append_and_read_back() {
        let mut table = ColumnarTable::from_schema("t", &sample_schema());
        table
            .append_row(&[
                Cell::Number(1.5),
                Cell::Number(1_704_067_200.5),
                Cell::Text("hello".to_string()),
            ])
            .unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value_by_name(0, "x"), Some(Cell::Number(1.5)));
        assert_eq!(
            table.value(0, 2),
            Some(Cell::Text("hello".to_string()))
        );
        assert_eq!(
            table.row_as_strings(0).unwrap(),
            vec!["1.5", "1704067200.5", "hello"]
        );
        assert_eq!(table.row_as_strings(1), None);
    }

    #[test]
    fn test_rejected_row_leaves_table_unchanged() {
        let mut table = ColumnarTable::from_schema("t", &sample_schema());

        let too_short = table.append_row(&[Cell::Number(1.0)]);
        assert!(matches!(
            too_short,
            Err(TableError::RowWidth {
                expected: 3,
                actual: 1,
                ..
            })
        ));

        let wrong_kind = table.append_row(&[
            Cell::Number(1.0),
            Cell::Text("oops".to_string()),
            Cell::Text("s".to_string()),
        ]);
        assert!(matches!(wrong_kind, Err(TableError::CellKind { .. })));

        assert_eq!(table.row_count(), 0);
        assert!(table.columns().iter().all(|c| c.data.is_empty()));
    }

    #[test]
    fn test_debug_dump_lists_columns() {
        let mut table = ColumnarTable::from_schema("Dump", &sample_schema());
        table
            .append_row(&[
                Cell::Number(2.0),
                Cell::Number(-1.0),
                Cell::Text("a".to_string()),
            ])
            .unwrap();

        let dump = table.debug_dump();
        assert!(dump.contains("ColumnarTable: Dump"));
        assert!(dump.contains("t (timestamp)"));
        assert!(dump.contains("[0]: 2, -1, a"));
    }
}
