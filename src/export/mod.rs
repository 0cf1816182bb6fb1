//! The `csv` command: filtered trace rows as a CSV table.

pub mod csv;

pub use self::csv::{CsvExporter, Dialect};

use crate::Result;
use crate::filter::{FilterChain, FilterConfig};
use crate::report::Reporter;
use crate::trace::TraceParser;
use anyhow::Context;
use chrono::NaiveDateTime;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub data: PathBuf,
    pub base_date: Option<NaiveDateTime>,
    pub filters: FilterConfig,
    pub output: PathBuf,
    pub dialect: Dialect,
    pub delimiter: Option<u8>,
}

/// Parse, filter and write. Returns the number of rows written.
///
/// Rows are staged in a temporary file next to the output, which only
/// replaces `output` once the whole trace was read without error.
pub fn write_csv(config: &CsvConfig, reporter: &dyn Reporter) -> Result<usize> {
    let parser = TraceParser::open(&config.data, config.base_date, reporter)?;
    let chain = FilterChain::from_config(&config.filters);

    let dir = match config.output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("create csv file in {}", dir.display()))?;

    let written = {
        let mut exporter =
            CsvExporter::new(BufWriter::new(&mut staging), config.dialect, config.delimiter);
        exporter
            .write_all(chain.apply(parser))
            .with_context(|| format!("export {}", config.data.display()))?
    };

    staging
        .persist(&config.output)
        .map_err(|e| e.error)
        .with_context(|| format!("write csv file {}", config.output.display()))?;

    if written == 0 {
        reporter.info("no rows, so csv header was not written");
    } else {
        reporter.info(&format!(
            "wrote {} rows to {}",
            written,
            config.output.display()
        ));
    }
    Ok(written)
}
