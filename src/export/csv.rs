use crate::error::TraceError;
use crate::trace::Row;
use anyhow::Context;
use std::io::Write;

/// CSV flavours offered on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Comma separated, CRLF line endings, minimal quoting.
    #[default]
    Excel,
    /// Tab separated, CRLF line endings, minimal quoting.
    ExcelTab,
    /// Comma separated, LF line endings, every field quoted.
    Unix,
}

impl Dialect {
    pub fn delimiter(self) -> u8 {
        match self {
            Dialect::Excel | Dialect::Unix => b',',
            Dialect::ExcelTab => b'\t',
        }
    }

    fn builder(self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter());
        match self {
            Dialect::Excel | Dialect::ExcelTab => {
                builder
                    .terminator(csv::Terminator::CRLF)
                    .quote_style(csv::QuoteStyle::Necessary);
            }
            Dialect::Unix => {
                builder
                    .terminator(csv::Terminator::Any(b'\n'))
                    .quote_style(csv::QuoteStyle::Always);
            }
        }
        builder
    }
}

/// Writes a header once, then one record per row.
///
/// Nothing, not even the header, is written until the first row arrives.
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
    rows: usize,
}

impl<W: Write> CsvExporter<W> {
    /// `delimiter` overrides the dialect's separator.
    pub fn new(inner: W, dialect: Dialect, delimiter: Option<u8>) -> Self {
        let mut builder = dialect.builder();
        if let Some(delimiter) = delimiter {
            builder.delimiter(delimiter);
        }
        Self {
            writer: builder.from_writer(inner),
            header_written: false,
            rows: 0,
        }
    }

    /// Header is the first row's columns.
    pub fn write_row(&mut self, row: &Row) -> anyhow::Result<()> {
        if !self.header_written {
            self.writer
                .write_record(row.columns())
                .context("write csv header")?;
            self.header_written = true;
        }
        self.writer
            .write_record(row.values().map(|v| v.to_string()))
            .context("write csv record")?;
        self.rows += 1;
        Ok(())
    }

    /// Drain `rows`, stopping at the first trace error. Returns the number of
    /// rows written.
    pub fn write_all<I>(&mut self, rows: I) -> anyhow::Result<usize>
    where
        I: IntoIterator<Item = Result<Row, TraceError>>,
    {
        for row in rows {
            self.write_row(&row?)?;
        }
        self.writer.flush().context("flush csv output")?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Value;
    use pretty_assertions::assert_eq;

    fn row(comm: &str, latency: f64) -> Row {
        [
            ("COMM", Value::Str(comm.into())),
            ("PID", Value::Int(42)),
            ("LATms", Value::Float(latency)),
        ]
        .into_iter()
        .collect()
    }

    fn export(dialect: Dialect, delimiter: Option<u8>, rows: Vec<Row>) -> String {
        let mut out = Vec::new();
        CsvExporter::new(&mut out, dialect, delimiter)
            .write_all(rows.into_iter().map(Ok))
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn excel_dialect() {
        let out = export(Dialect::Excel, None, vec![row("bash", 5.0), row("a,b", 0.25)]);
        assert_eq!(out, "COMM,PID,LATms\r\nbash,42,5.0\r\n\"a,b\",42,0.25\r\n");
    }

    #[test]
    fn tab_and_unix_dialects() {
        assert_eq!(
            export(Dialect::ExcelTab, None, vec![row("dd", 1.5)]),
            "COMM\tPID\tLATms\r\ndd\t42\t1.5\r\n"
        );
        assert_eq!(
            export(Dialect::Unix, None, vec![row("dd", 1.5)]),
            "\"COMM\",\"PID\",\"LATms\"\n\"dd\",\"42\",\"1.5\"\n"
        );
    }

    #[test]
    fn separator_overrides_dialect() {
        assert_eq!(
            export(Dialect::Excel, Some(b'\t'), vec![row("dd", 1.5)]),
            "COMM\tPID\tLATms\r\ndd\t42\t1.5\r\n"
        );
    }

    #[test]
    fn no_rows_no_header() {
        assert_eq!(export(Dialect::Excel, None, vec![]), "");
    }

    #[test]
    fn trace_error_aborts() {
        let mut out = Vec::new();
        let rows = vec![Ok(row("dd", 1.0)), Err(TraceError::SchemaNotFound { line: 9 })];
        let err = CsvExporter::new(&mut out, Dialect::Excel, None)
            .write_all(rows)
            .unwrap_err();
        assert!(err.to_string().contains("line 9"));
    }
}
