//! Error types for loading tables and deriving features

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the CSV extracts or building features
#[derive(Debug, Error)]
pub enum DataError {
    /// Source directory or table absent
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Expected column not present in a loaded table
    #[error("Table `{table}` has no column `{column}`")]
    MissingColumn { table: String, column: String },

    /// An inner join collapsed to zero rows
    #[error("Join stage `{stage}` produced no rows (order_id key spaces do not overlap)")]
    EmptyJoinResult { stage: &'static str },

    /// A timestamp cell could not be parsed
    #[error("Malformed date in `{column}`: {value:?}")]
    MalformedDate { column: &'static str, value: String },

    /// A CSV file failed to parse
    #[error("Failed to read {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl DataError {
    pub(crate) fn missing_column(table: &str, column: &str) -> Self {
        DataError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::missing_column("orders", "order_status");
        assert_eq!(
            err.to_string(),
            "Table `orders` has no column `order_status`"
        );

        let err = DataError::EmptyJoinResult { stage: "review_score" };
        assert!(err.to_string().contains("review_score"));

        let err = DataError::MalformedDate {
            column: "order_purchase_timestamp",
            value: "yesterday".to_string(),
        };
        assert!(err.to_string().contains("\"yesterday\""));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DataError = io.into();
        assert!(matches!(err, DataError::Io(_)));
    }
}
