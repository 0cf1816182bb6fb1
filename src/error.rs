//! Typed errors for the trace pipeline.
//!
//! Command-level code wraps these in `anyhow` with context; library callers can
//! match on the variants.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("invalid integer {token:?}")]
    InvalidInteger {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float {token:?}")]
    InvalidFloat {
        token: String,
        #[source]
        source: ParseFloatError,
    },
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("cannot open trace file {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read trace")]
    Read(#[from] std::io::Error),

    #[error("line {line}: data row before any header line")]
    SchemaNotFound { line: usize },

    #[error("line {line}: cannot decode column {column}")]
    Decode {
        line: usize,
        column: String,
        #[source]
        source: FieldError,
    },

    #[error("line {line}: missing value for column {column}")]
    MissingField { line: usize, column: String },

    #[error("line {line}: row has no STARTs column to anchor relative time")]
    MissingTimestamp { line: usize },

    #[error("line {line}: local time is out of range for the base date")]
    LocalTimeOverflow { line: usize },
}

#[derive(Error, Debug)]
pub enum BinError {
    #[error("no rows to bin")]
    EmptyRows,

    #[error("{axis} interval must be positive and finite, got {interval}")]
    InvalidInterval { axis: &'static str, interval: f64 },

    #[error("{axis} axis maximum {max} is out of range")]
    MaxOutOfRange { axis: &'static str, max: f64 },

    #[error("{axis} axis up to {max} in steps of {width} needs too many buckets")]
    TooManyBuckets {
        axis: &'static str,
        max: f64,
        width: f64,
    },

    #[error("heatmap of {cells} cells is too large, raise the intervals")]
    GridTooLarge { cells: usize },
}

#[derive(Error, Debug, PartialEq)]
pub enum ConditionError {
    #[error("cannot parse condition {0:?}, expected: COLUMN OP VALUE")]
    Malformed(String),

    #[error("unknown column {column:?} in condition {expr:?}")]
    UnknownColumn { column: String, expr: String },

    #[error("operator {op:?} needs a numeric value in condition {expr:?}")]
    NotNumeric { op: String, expr: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_line_and_column() {
        let source = "x".parse::<i64>().unwrap_err();
        let err = TraceError::Decode {
            line: 3,
            column: "PID".into(),
            source: FieldError::InvalidInteger {
                token: "x".into(),
                source,
            },
        };
        assert_eq!(err.to_string(), "line 3: cannot decode column PID");
    }

    #[test]
    fn source_unavailable_shows_path() {
        let err = TraceError::SourceUnavailable {
            path: PathBuf::from("/nope/trace.log"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "cannot open trace file /nope/trace.log");
    }
}
