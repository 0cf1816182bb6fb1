use anyhow::Context;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parse a base date given as `yyyymmddHHMMSS`.
pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .with_context(|| format!("bad datetime {:?}, expected yyyymmddHHMMSS", s))
}

/// Output file named after the input: `path/to/sample.data` -> `sample.<ext>`.
pub fn make_output_file(path: &Path, ext: &str) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|n| !n.is_empty())
        .unwrap_or("iosnoop");
    PathBuf::from(format!("{}.{}", name, ext))
}
