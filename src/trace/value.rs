//! Field decoding: raw whitespace token -> typed value, keyed by column name.

use crate::error::FieldError;
use crate::trace::columns::{
    DISK_BLOCK, END_TIME_STAMP, IO_LATENCY, IO_SIZE, PROCESS_ID, START_TIME_STAMP,
};
use chrono::NaiveDateTime;
use std::fmt;

/// A decoded cell of a trace row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Time(NaiveDateTime),
}

impl Value {
    /// Numeric view used by comparisons and binning.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) | Value::Time(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part ("5.0"), Display would print "5".
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(s) => f.write_str(s),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// How a column's tokens are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    Float,
    Text,
}

impl Coercion {
    pub fn for_column(column: &str) -> Self {
        match column {
            PROCESS_ID | DISK_BLOCK | IO_SIZE => Coercion::Integer,
            START_TIME_STAMP | END_TIME_STAMP | IO_LATENCY => Coercion::Float,
            _ => Coercion::Text,
        }
    }
}

/// Decode one token for `column`. Unknown columns pass through as strings.
pub fn decode(column: &str, token: &str) -> Result<Value, FieldError> {
    match Coercion::for_column(column) {
        Coercion::Integer => token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|source| FieldError::InvalidInteger {
                token: token.to_string(),
                source,
            }),
        Coercion::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|source| FieldError::InvalidFloat {
                token: token.to_string(),
                source,
            }),
        Coercion::Text => Ok(Value::Str(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::columns::{COMMAND, DEVICE_ID};
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_columns_parse_as_int() {
        assert_eq!(decode(PROCESS_ID, "42").unwrap(), Value::Int(42));
        assert_eq!(decode(DISK_BLOCK, "1000").unwrap(), Value::Int(1000));
        assert_eq!(decode(IO_SIZE, "4096").unwrap(), Value::Int(4096));
    }

    #[test]
    fn timing_columns_parse_as_float() {
        assert_eq!(decode(START_TIME_STAMP, "100.5").unwrap(), Value::Float(100.5));
        assert_eq!(decode(END_TIME_STAMP, "101").unwrap(), Value::Float(101.0));
        assert_eq!(decode(IO_LATENCY, "5.00").unwrap(), Value::Float(5.0));
    }

    #[test]
    fn other_columns_pass_through() {
        assert_eq!(decode(COMMAND, "bash").unwrap(), Value::Str("bash".into()));
        assert_eq!(decode(DEVICE_ID, "8,0").unwrap(), Value::Str("8,0".into()));
        assert_eq!(decode("UNKNOWN", "12").unwrap(), Value::Str("12".into()));
    }

    #[test]
    fn malformed_tokens_fail() {
        assert!(matches!(
            decode(PROCESS_ID, "4x2"),
            Err(FieldError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode(IO_LATENCY, "fast"),
            Err(FieldError::InvalidFloat { .. })
        ));
    }

    #[test]
    fn display_keeps_float_fraction() {
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Int(7).to_string(), "7");
    }
}
