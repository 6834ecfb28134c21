//! Error types for loading and aggregation.

use thiserror::Error;

/// Failure to turn a file into a [`MeasurementTable`](crate::data::model::MeasurementTable).
///
/// Any of these aborts the load; the caller keeps whatever dataset it had.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File missing or unreadable
    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV, including values that are neither numbers nor missing tokens
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unreadable Parquet file
    #[error("failed to read Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow decoding failure inside a Parquet file
    #[error("failed to decode Arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Header lacks columns the pipeline needs
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Extension not handled by any loader
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    /// A cell that cannot be interpreted for its column
    #[error("row {row}, column '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: String,
        message: String,
    },
}

/// Conditions reported by the aggregation pipeline.
///
/// Degenerate arithmetic (zero baseline, constant column) is not an error:
/// it yields sentinel values inside the views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The station filter matched no rows; every view is empty.
    #[error("no measurements match filter '{filter}'")]
    EmptyResult { filter: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_names() {
        let err = LoadError::MissingColumns(vec!["station".into(), "PM10".into()]);
        assert_eq!(err.to_string(), "missing required columns: station, PM10");
    }

    #[test]
    fn empty_result_names_filter() {
        let err = AggregationError::EmptyResult {
            filter: "Gucheng".into(),
        };
        assert_eq!(err.to_string(), "no measurements match filter 'Gucheng'");
    }
}
