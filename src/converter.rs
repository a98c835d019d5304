//! Conversion driver: archive payloads in, one table per payload out
//!
//! Payloads are processed one at a time in the order given. A payload that
//! fails is logged and skipped; only failing to write the output container
//! stops the run.

use crate::config::ConvertConfig;
use crate::data::columnar_table::ColumnarTable;
use crate::data::populator::{ColumnarPopulator, PopulateStats};
use crate::data::schema::ColumnType;
use crate::data::type_inference::TypeInference;
use crate::error::StreamError;
use crate::export::{open_sink, TableSink};
use crate::source::archive::{ArchiveExtractor, ZipExtractor};
use crate::source::xml_records::PayloadReader;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// One payload that made it into the container
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub payload: String,
    pub table_name: String,
    pub columns: Vec<(String, ColumnType)>,
    pub stats: PopulateStats,
}

impl TableSummary {
    pub fn rows(&self) -> usize {
        self.stats.rows
    }
}

#[derive(Debug)]
pub struct SkippedPayload {
    pub payload: String,
    pub error: StreamError,
}

#[derive(Debug)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub converted: Vec<TableSummary>,
    pub skipped: Vec<SkippedPayload>,
}

impl ConversionReport {
    pub fn total_rows(&self) -> usize {
        self.converted.iter().map(TableSummary::rows).sum()
    }
}

/// Convert every configured payload of the archive into the output container
pub fn convert(config: &ConvertConfig) -> Result<ConversionReport> {
    let mut extractor = ZipExtractor::new(&config.archive_path);
    let source = config.archive_path.display().to_string();
    let sink = open_sink(config.format, &config.output_path, &source, config.pretty)
        .with_context(|| format!("Cannot open output {:?}", config.output_path))?;

    convert_with(config, &mut extractor, sink)
}

/// Same as `convert` with the archive and container supplied by the caller
pub fn convert_with(
    config: &ConvertConfig,
    extractor: &mut dyn ArchiveExtractor,
    mut sink: Box<dyn TableSink>,
) -> Result<ConversionReport> {
    let mut converted = Vec::new();
    let mut skipped = Vec::new();

    for payload in &config.payloads {
        match convert_payload(config, extractor, payload) {
            Ok((table, summary)) => {
                sink.write_table(&table)
                    .with_context(|| format!("Failed to write table {}", table.name))?;
                info!(
                    target: "converter",
                    "{} -> {}: {} rows, {} columns (~{} KB)",
                    payload,
                    table.name,
                    table.row_count(),
                    table.column_count(),
                    table.estimate_memory_size() / 1024
                );
                converted.push(summary);
            }
            Err(err) => {
                error!(target: "converter", "skipping {} ({}): {}", payload, err.kind(), err);
                skipped.push(SkippedPayload {
                    payload: payload.clone(),
                    error: err,
                });
            }
        }
    }

    let output_path = sink.finish()?;

    Ok(ConversionReport {
        output_path,
        converted,
        skipped,
    })
}

fn convert_payload(
    config: &ConvertConfig,
    extractor: &mut dyn ArchiveExtractor,
    payload: &str,
) -> Result<(ColumnarTable, TableSummary), StreamError> {
    let member = config.member_name(payload);
    let bytes = extractor.extract(&member)?;

    let mut reader = PayloadReader::open(payload, &bytes)?;
    let table_name = reader.root_name().to_string();

    let first = match reader.next() {
        Some(record) => record?,
        None => {
            return Err(StreamError::EmptyStream {
                payload: payload.to_string(),
            })
        }
    };

    let schema = TypeInference::infer_schema(&first.attributes);
    let mut table = ColumnarTable::from_schema(&table_name, &schema);

    let records = std::iter::once(Ok(first)).chain(reader);
    let stats = ColumnarPopulator::new(config.missing_attribute).populate_with_stats(
        &mut table,
        &schema,
        records,
    )?;

    debug!(target: "converter", "{}", table.debug_dump());

    let summary = TableSummary {
        payload: payload.to_string(),
        table_name,
        columns: schema
            .iter()
            .map(|e| (e.name.clone(), e.column_type))
            .collect(),
        stats,
    };
    Ok((table, summary))
}
