//! Conversion of radiosonde MWX archives into typed columnar tables.
//!
//! Each XML payload inside the archive becomes one table. Column types are
//! inferred from the first record of the payload, then every record is
//! streamed into per-column storage and written to a JSON container or a
//! directory of CSV files.

pub mod config;
pub mod converter;
pub mod data;
pub mod error;
pub mod export;
pub mod source;
pub mod utils;

pub use config::ConvertConfig;
pub use converter::{convert, ConversionReport};
