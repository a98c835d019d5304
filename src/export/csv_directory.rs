use crate::data::columnar_table::ColumnarTable;
use crate::data::schema::ColumnType;
use crate::export::TableSink;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SCHEMA_FILE: &str = "schema.json";

/// Column types for every table in the directory, written as `schema.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySchema {
    pub source: String,
    pub tables: BTreeMap<String, Vec<SchemaColumn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Writes one `<table>.csv` per table into a directory
pub struct CsvDirectorySink {
    dir: PathBuf,
    schema: DirectorySchema,
}

impl CsvDirectorySink {
    /// Open the directory, removing tables left by an earlier run so the
    /// result holds only what this run writes. Other files are left alone.
    pub fn create<P: AsRef<Path>>(dir: P, source: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        Self::clear_previous_output(&dir)?;

        Ok(Self {
            dir,
            schema: DirectorySchema {
                source: source.to_string(),
                tables: BTreeMap::new(),
            },
        })
    }

    fn clear_previous_output(dir: &Path) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))?;

        for entry in entries {
            let path = entry?.path();
            let stale = path.is_file()
                && (path.extension().is_some_and(|ext| ext == "csv")
                    || path.file_name().is_some_and(|name| name == SCHEMA_FILE));
            if stale {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove old output {:?}", path))?;
                debug!(target: "export", "removed old output {}", path.display());
            }
        }
        Ok(())
    }

    /// File name for a table; namespace separators are not portable in paths
    fn file_name(table_name: &str) -> String {
        let stem: String = table_name
            .chars()
            .map(|c| if matches!(c, ':' | '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}.csv", stem)
    }
}

impl TableSink for CsvDirectorySink {
    fn write_table(&mut self, table: &ColumnarTable) -> Result<()> {
        let path = self.dir.join(Self::file_name(&table.name));
        let file =
            File::create(&path).with_context(|| format!("Failed to create CSV file: {:?}", path))?;
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(table.column_names())?;
        for row in 0..table.row_count() {
            if let Some(values) = table.row_as_strings(row) {
                writer.write_record(&values)?;
            }
        }
        writer.flush()?;

        let columns = table
            .columns()
            .iter()
            .map(|c| SchemaColumn {
                name: c.name.clone(),
                column_type: c.column_type,
            })
            .collect();
        if self.schema.tables.insert(table.name.clone(), columns).is_some() {
            warn!(target: "export", "table {} written twice, keeping the later one", table.name);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf> {
        let schema_path = self.dir.join(SCHEMA_FILE);
        let file = File::create(&schema_path)
            .with_context(|| format!("Failed to create {:?}", schema_path))?;
        serde_json::to_writer_pretty(file, &self.schema)?;

        info!(
            target: "export",
            "wrote {} table(s) to {}",
            self.schema.tables.len(),
            self.dir.display()
        );
        Ok(self.dir)
    }
}
