//! Schema inference and the columnar storage it feeds

pub mod columnar_table;
pub mod populator;
pub mod record;
pub mod row_builder;
pub mod schema;
pub mod type_inference;
pub mod value_parsing;
