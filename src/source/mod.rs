//! Reading payload records out of an MWX archive

pub mod archive;
pub mod xml_records;

pub use archive::{ArchiveExtractor, ZipExtractor};
pub use xml_records::PayloadReader;
