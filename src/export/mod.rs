//! Table containers the converted payloads are written to
//!
//! A container is opened once per run and receives one table per converted
//! payload, in conversion order.

pub mod csv_directory;
pub mod json_container;

use crate::data::columnar_table::ColumnarTable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use csv_directory::CsvDirectorySink;
pub use json_container::{ContainerDocument, JsonContainerSink};

/// Destination for converted tables
pub trait TableSink {
    /// Add a table to the container. A table with the same name as an earlier
    /// one replaces it.
    fn write_table(&mut self, table: &ColumnarTable) -> Result<()>;

    /// Flush everything and return the container path
    fn finish(self: Box<Self>) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Single JSON document holding every table
    #[default]
    Json,
    /// Directory with one CSV file per table
    Csv,
}

impl OutputFormat {
    /// Extension used when the output path is derived from the archive path
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "tables",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}' (expected json or csv)", other)),
        }
    }
}

/// Create the container for `format` at `path`, truncating anything already there
pub fn open_sink(
    format: OutputFormat,
    path: &Path,
    source: &str,
    pretty: bool,
) -> Result<Box<dyn TableSink>> {
    match format {
        OutputFormat::Json => Ok(Box::new(JsonContainerSink::create(path, source, pretty)?)),
        OutputFormat::Csv => Ok(Box::new(CsvDirectorySink::create(path, source)?)),
    }
}
