use crate::trace::columns::{IO_LATENCY, START_LOCAL_TIME, START_TIME_STAMP, START_TIME_STAMP_DIFF};
use crate::trace::value::Value;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// A decoded trace record: schema columns in header order, then the derived
/// `STARTs_DIFF` and (optionally) `STARTs_LOCAL_TIME` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fields: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drop every column not accepted by `keep`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|column, _| keep(column.as_str()));
    }

    pub fn start_time_stamp(&self) -> Option<f64> {
        self.get(START_TIME_STAMP).and_then(Value::as_f64)
    }

    /// Seconds since the anchor row.
    pub fn since_start(&self) -> Option<f64> {
        self.get(START_TIME_STAMP_DIFF).and_then(Value::as_f64)
    }

    pub fn local_time(&self) -> Option<NaiveDateTime> {
        self.get(START_LOCAL_TIME).and_then(Value::as_time)
    }

    pub fn latency(&self) -> Option<f64> {
        self.get(IO_LATENCY).and_then(Value::as_f64)
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
