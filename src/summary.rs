//! Distinct-value overview of the rows that go into a plot.

use crate::report::Reporter;
use crate::trace::Row;
use crate::trace::columns::{COMMAND, DEVICE_ID, IO_SIZE, IO_TYPE, PROCESS_ID};
use indexmap::IndexSet;

/// Columns are only listed value by value up to this many distinct values.
pub const SHOW_MAX_UNIQUE_VALUES: usize = 50;

pub const SUMMARY_COLUMNS: [&str; 5] = [COMMAND, PROCESS_ID, IO_TYPE, DEVICE_ID, IO_SIZE];

/// Distinct values of `column`, in order of first appearance.
pub fn unique_values(rows: &[Row], column: &str) -> IndexSet<String> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .map(|v| v.to_string())
        .collect()
}

pub fn show_unique_values(rows: &[Row], reporter: &dyn Reporter) {
    for column in SUMMARY_COLUMNS {
        let values = unique_values(rows, column);
        let mut message = format!("{} column has {} values", column, values.len());
        if values.len() <= SHOW_MAX_UNIQUE_VALUES {
            message.push_str(" and they are as below");
            for value in &values {
                message.push_str("\n  - ");
                message.push_str(value);
            }
        }
        reporter.info(&message);
    }
}
