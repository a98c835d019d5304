//! Error types for payload conversion
//!
//! A `StreamError` stops one payload and nothing else: the converter logs it,
//! records it in the report and moves on to the next payload. Value coercion
//! problems never surface here, they degrade to sentinel values instead.

use thiserror::Error;

/// Faults that skip a single payload stream
#[derive(Debug, Error)]
pub enum StreamError {
    /// Archive unreadable, member absent, or member empty
    #[error("{member} could not be read from {archive}: {reason}")]
    Extraction {
        archive: String,
        member: String,
        reason: String,
    },

    /// Payload root has no record elements
    #[error("{payload} has no child records")]
    EmptyStream { payload: String },

    /// Payload bytes are not usable XML
    #[error("{payload} is not valid XML: {reason}")]
    Xml { payload: String, reason: String },

    /// Rows could not be committed to the table
    #[error("{payload} could not be populated: {source}")]
    Populate {
        payload: String,
        #[source]
        source: TableError,
    },
}

impl StreamError {
    /// Short tag used in reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::Extraction { .. } => "extraction",
            StreamError::EmptyStream { .. } => "empty_stream",
            StreamError::Xml { .. } => "xml",
            StreamError::Populate { .. } => "populate",
        }
    }
}

/// Structural errors from the columnar table
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row for {table} has {actual} values but the table has {expected} columns")]
    RowWidth {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("cell for {table}.{column} does not match the column storage")]
    CellKind { table: String, column: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_payload() {
        let err = StreamError::Extraction {
            archive: "flight.mwx".to_string(),
            member: "GpsResults.xml".to_string(),
            reason: "member not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GpsResults.xml could not be read from flight.mwx: member not found"
        );
        assert_eq!(err.kind(), "extraction");

        let err = StreamError::EmptyStream {
            payload: "Soundings".to_string(),
        };
        assert_eq!(err.to_string(), "Soundings has no child records");
    }
}
