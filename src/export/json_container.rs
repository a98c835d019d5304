use crate::data::columnar_table::{ColumnData, ColumnarTable};
use crate::data::schema::ColumnType;
use crate::export::TableSink;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FORMAT_VERSION: u32 = 1;

/// On-disk layout of a JSON table container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDocument {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub tables: Vec<ContainerTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerTable {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<ContainerColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub values: ColumnValues,
}

/// Column values; non-finite doubles are written as `null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Numbers(Vec<Option<f64>>),
    Text(Vec<String>),
}

impl ContainerTable {
    pub fn from_table(table: &ColumnarTable) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|column| ContainerColumn {
                name: column.name.clone(),
                column_type: column.column_type,
                values: match &column.data {
                    ColumnData::Float64(v) => ColumnValues::Numbers(
                        v.iter().map(|x| x.is_finite().then_some(*x)).collect(),
                    ),
                    ColumnData::Text(v) => ColumnValues::Text(v.clone()),
                },
            })
            .collect();

        Self {
            name: table.name.clone(),
            row_count: table.row_count(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ContainerColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl ContainerDocument {
    pub fn table(&self, name: &str) -> Option<&ContainerTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Load a container written by `JsonContainerSink`
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open container: {:?}", path.as_ref()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse container: {:?}", path.as_ref()))
    }
}

/// Writes every table into one JSON document.
///
/// The file is created when the sink is opened so an unwritable destination
/// fails before any payload is converted.
pub struct JsonContainerSink {
    path: PathBuf,
    writer: BufWriter<File>,
    document: ContainerDocument,
    pretty: bool,
}

impl JsonContainerSink {
    pub fn create<P: AsRef<Path>>(path: P, source: &str, pretty: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output container: {:?}", path))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            document: ContainerDocument {
                format_version: FORMAT_VERSION,
                created_at: Utc::now(),
                source: source.to_string(),
                tables: Vec::new(),
            },
            pretty,
        })
    }
}

impl TableSink for JsonContainerSink {
    fn write_table(&mut self, table: &ColumnarTable) -> Result<()> {
        let entry = ContainerTable::from_table(table);

        match self.document.tables.iter_mut().find(|t| t.name == entry.name) {
            Some(existing) => {
                warn!(target: "export", "table {} written twice, keeping the later one", entry.name);
                *existing = entry;
            }
            None => self.document.tables.push(entry),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf> {
        let mut this = *self;

        if this.pretty {
            serde_json::to_writer_pretty(&mut this.writer, &this.document)?;
        } else {
            serde_json::to_writer(&mut this.writer, &this.document)?;
        }
        this.writer.write_all(b"\n")?;
        this.writer
            .flush()
            .with_context(|| format!("Failed to write output container: {:?}", this.path))?;

        info!(
            target: "export",
            "wrote {} table(s) to {}",
            this.document.tables.len(),
            this.path.display()
        );
        Ok(this.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columnar_table::Cell;
    use crate::data::schema::Schema;
    use tempfile::TempDir;

    fn table(name: &str, x: f64) -> ColumnarTable {
        let mut schema = Schema::new();
        schema.push("x", ColumnType::Numeric);
        schema.push("s", ColumnType::Text);
        let mut table = ColumnarTable::from_schema(name, &schema);
        table
            .append_row(&[Cell::Number(x), Cell::Text("a".to_string())])
            .unwrap();
        table
            .append_row(&[Cell::Number(f64::NAN), Cell::Text(String::new())])
            .unwrap();
        table
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flight.json");

        let mut sink: Box<dyn TableSink> =
            Box::new(JsonContainerSink::create(&path, "flight.mwx", true).unwrap());
        sink.write_table(&table("GpsResults", 1.5)).unwrap();
        assert_eq!(sink.finish().unwrap(), path);

        let doc = ContainerDocument::read(&path).unwrap();
        assert_eq!(doc.format_version, FORMAT_VERSION);
        assert_eq!(doc.source, "flight.mwx");

        let gps = doc.table("GpsResults").unwrap();
        assert_eq!(gps.row_count, 2);
        assert_eq!(gps.column("x").unwrap().column_type, ColumnType::Numeric);
        assert_eq!(
            gps.column("x").unwrap().values,
            ColumnValues::Numbers(vec![Some(1.5), None])
        );
        assert_eq!(
            gps.column("s").unwrap().values,
            ColumnValues::Text(vec!["a".to_string(), String::new()])
        );
    }

    #[test]
    fn test_same_name_replaces_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let mut sink: Box<dyn TableSink> =
            Box::new(JsonContainerSink::create(&path, "src", false).unwrap());
        sink.write_table(&table("T", 1.0)).unwrap();
        sink.write_table(&table("U", 2.0)).unwrap();
        sink.write_table(&table("T", 3.0)).unwrap();
        sink.finish().unwrap();

        let doc = ContainerDocument::read(&path).unwrap();
        let names: Vec<&str> = doc.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["T", "U"]);
        assert_eq!(
            doc.table("T").unwrap().column("x").unwrap().values,
            ColumnValues::Numbers(vec![Some(3.0), None])
        );
    }

    #[test]
    fn test_unwritable_destination_fails_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(JsonContainerSink::create(&path, "src", false).is_err());
    }
}
