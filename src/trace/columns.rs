//! Column identifiers used by iosnoop output.
//!
//! Example header:
//! STARTs         ENDs           COMM         PID    TYPE DEV      BLOCK        BYTES     LATms

pub const START_TIME_STAMP: &str = "STARTs";
pub const END_TIME_STAMP: &str = "ENDs";
pub const COMMAND: &str = "COMM";
pub const PROCESS_ID: &str = "PID";
pub const IO_TYPE: &str = "TYPE";
pub const DEVICE_ID: &str = "DEV";
pub const DISK_BLOCK: &str = "BLOCK";
pub const IO_SIZE: &str = "BYTES";
pub const IO_LATENCY: &str = "LATms";

/// Seconds since the first data row of the parse.
pub const START_TIME_STAMP_DIFF: &str = "STARTs_DIFF";
/// Base date plus `STARTs_DIFF`, only present when a base date is configured.
pub const START_LOCAL_TIME: &str = "STARTs_LOCAL_TIME";

pub const KNOWN_COLUMNS: [&str; 9] = [
    START_TIME_STAMP,
    END_TIME_STAMP,
    COMMAND,
    PROCESS_ID,
    IO_TYPE,
    DEVICE_ID,
    DISK_BLOCK,
    IO_SIZE,
    IO_LATENCY,
];

pub const EXTRA_COLUMNS: [&str; 2] = [START_TIME_STAMP_DIFF, START_LOCAL_TIME];

/// True for any column a row can carry, trace or derived.
pub fn is_known(column: &str) -> bool {
    KNOWN_COLUMNS.contains(&column) || EXTRA_COLUMNS.contains(&column)
}
