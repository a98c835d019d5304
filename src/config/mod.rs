//! Configuration module
//!
//! File-backed settings and the per-run conversion config built from them.

pub mod config;
pub mod convert_config;

pub use convert_config::{derive_output_path, ConvertConfig};
