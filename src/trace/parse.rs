use crate::error::TraceError;
use crate::report::Reporter;
use crate::trace::columns::{START_LOCAL_TIME, START_TIME_STAMP_DIFF};
use crate::trace::row::Row;
use crate::trace::value::{Value, decode};
use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// iosnoop prints a banner such as "Tracing block I/O. Ctrl-C to end." before
/// the header.
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tracing").expect("description pattern is valid"));

/// Streaming iosnoop parser.
///
/// Reads the source one line at a time and yields decoded rows. The schema is
/// taken from the most recent header line; the first data row anchors
/// `STARTs_DIFF`. After the first error the iterator is exhausted.
pub struct TraceParser<'a, R> {
    lines: io::Lines<R>,
    lineno: usize,
    base_date: Option<NaiveDateTime>,
    schema: Option<Vec<String>>,
    anchor: Option<f64>,
    reporter: &'a dyn Reporter,
    done: bool,
}

impl<'a> TraceParser<'a, BufReader<File>> {
    /// Open an iosnoop output file. The file is closed when the parser drops.
    pub fn open(
        path: impl AsRef<Path>,
        base_date: Option<NaiveDateTime>,
        reporter: &'a dyn Reporter,
    ) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TraceError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file), base_date, reporter))
    }
}

impl<'a, R: BufRead> TraceParser<'a, R> {
    pub fn from_reader(
        reader: R,
        base_date: Option<NaiveDateTime>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            lines: reader.lines(),
            lineno: 0,
            base_date,
            schema: None,
            anchor: None,
            reporter,
            done: false,
        }
    }

    /// Every column a row carries: schema, then the derived columns.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.schema.clone().unwrap_or_default();
        columns.push(START_TIME_STAMP_DIFF.to_string());
        if self.base_date.is_some() {
            columns.push(START_LOCAL_TIME.to_string());
        }
        columns
    }

    fn parse_line(&mut self, line: &str) -> Result<Option<Row>, TraceError> {
        let lineno = self.lineno;
        let Some(first) = line.split_whitespace().next() else {
            return Ok(None);
        };

        if first.parse::<f64>().is_err() {
            self.reporter.debug(line.trim());
            if DESCRIPTION_RE.is_match(line) {
                return Ok(None);
            }
            // Not a description, so this must be the header.
            self.schema = Some(line.split_whitespace().map(str::to_string).collect());
            return Ok(None);
        }

        let schema = self
            .schema
            .as_ref()
            .ok_or(TraceError::SchemaNotFound { line: lineno })?;

        let mut tokens = line.split_whitespace();
        let mut row = Row::new();
        for column in schema {
            let token = tokens.next().ok_or_else(|| TraceError::MissingField {
                line: lineno,
                column: column.clone(),
            })?;
            let value = decode(column, token).map_err(|source| TraceError::Decode {
                line: lineno,
                column: column.clone(),
                source,
            })?;
            row.insert(column.as_str(), value);
        }

        let start = row
            .start_time_stamp()
            .ok_or(TraceError::MissingTimestamp { line: lineno })?;
        let anchor = *self.anchor.get_or_insert(start);
        let since_start = start - anchor;
        row.insert(START_TIME_STAMP_DIFF, Value::Float(since_start));

        if let Some(base) = self.base_date {
            let time = local_time(base, since_start)
                .ok_or(TraceError::LocalTimeOverflow { line: lineno })?;
            row.insert(START_LOCAL_TIME, Value::Time(time));
        }

        Ok(Some(row))
    }
}

impl<R: BufRead> Iterator for TraceParser<'_, R> {
    type Item = Result<Row, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(TraceError::Read(e)));
                }
            };
            self.lineno += 1;

            match self.parse_line(&line) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// `base + seconds`, at microsecond resolution. `None` when the result is not
/// a representable date.
pub fn local_time(base: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    let micros = (seconds * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    base.checked_add_signed(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, Recorder};
    use crate::trace::columns::{IO_LATENCY, IO_SIZE, PROCESS_ID};
    use crate::util::parse_datetime;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const HEADER: &str = "STARTs ENDs COMM PID TYPE DEV BLOCK BYTES LATms\n";

    fn parse_all(text: &str, base: Option<NaiveDateTime>) -> Result<Vec<Row>, TraceError> {
        let reporter = Recorder::new();
        TraceParser::from_reader(text.as_bytes(), base, &reporter).collect()
    }

    #[test]
    fn decodes_single_row() {
        let text = format!("{HEADER}100.0 200.0 bash 42 R 8:0 1000 4096 5.0\n");
        let rows = parse_all(&text, None).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get(PROCESS_ID), Some(&Value::Int(42)));
        assert_eq!(row.get(IO_SIZE), Some(&Value::Int(4096)));
        assert_eq!(row.get(IO_LATENCY), Some(&Value::Float(5.0)));
        assert_eq!(row.get("COMM"), Some(&Value::Str("bash".into())));
        assert_eq!(row.since_start(), Some(0.0));
        assert_eq!(row.local_time(), None);
    }

    #[test]
    fn relative_time_is_measured_from_first_row() {
        let text = format!(
            "{HEADER}100.0 200.0 bash 42 R 8:0 1000 4096 5.0\n105.5 205.5 bash 42 R 8:0 1008 4096 1.5\n"
        );
        let rows = parse_all(&text, None).unwrap();
        let diffs: Vec<f64> = rows.iter().filter_map(Row::since_start).collect();
        assert_eq!(diffs, vec![0.0, 5.5]);
    }

    #[test]
    fn skips_blank_and_description_lines() {
        let text = format!(
            "Tracing block I/O. Ctrl-C to end.\n\n{HEADER}   \n1.0 2.0 dd 7 W 202,1 10 512 0.5\n\nTRACING again\n"
        );
        let rows = parse_all(&text, None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn non_data_lines_are_logged_at_debug() {
        let reporter = Recorder::new();
        let text = format!("Tracing block I/O\n{HEADER}");
        let rows: Vec<_> = TraceParser::from_reader(text.as_bytes(), None, &reporter).collect();
        assert!(rows.is_empty());
        assert!(reporter.contains(Level::Debug, "Tracing block I/O"));
        assert!(reporter.contains(Level::Debug, "STARTs ENDs"));
    }

    #[test]
    fn data_before_header_is_an_error() {
        let err = parse_all("1.0 2.0 dd 7 W 202,1 10 512 0.5\n", None).unwrap_err();
        assert!(matches!(err, TraceError::SchemaNotFound { line: 1 }));
    }

    #[test]
    fn decode_failure_stops_the_stream() {
        let text = format!(
            "{HEADER}1.0 2.0 dd seven W 202,1 10 512 0.5\n2.0 3.0 dd 7 W 202,1 10 512 0.5\n"
        );
        let reporter = Recorder::new();
        let mut parser = TraceParser::from_reader(text.as_bytes(), None, &reporter);

        match parser.next() {
            Some(Err(TraceError::Decode { line, column, .. })) => {
                assert_eq!(line, 2);
                assert_eq!(column, "PID");
            }
            other => panic!("expected decode error, got {:?}", other),
        }
        assert!(parser.next().is_none());
    }

    #[test]
    fn short_rows_report_the_missing_column() {
        let text = format!("{HEADER}1.0 2.0 dd 7 W\n");
        let err = parse_all(&text, None).unwrap_err();
        assert!(matches!(err, TraceError::MissingField { line: 2, ref column } if column == "DEV"));
    }

    #[test]
    fn later_header_replaces_schema() {
        let text = format!("{HEADER}1.0 2.0 dd 7 W 202,1 10 512 0.5\nSTARTs COMM\n3.0 cat\n");
        let rows = parse_all(&text, None).unwrap();
        assert_eq!(rows.len(), 2);
        let columns: Vec<&str> = rows[1].columns().collect();
        assert_eq!(columns, vec!["STARTs", "COMM", "STARTs_DIFF"]);
        assert_eq!(rows[1].since_start(), Some(2.0));
    }

    #[test]
    fn base_date_adds_local_time() {
        let base = parse_datetime("20170403153428").unwrap();
        let text = format!(
            "{HEADER}10.0 11.0 dd 7 W 202,1 10 512 0.5\n12.25 13.0 dd 7 W 202,1 18 512 0.5\n"
        );
        let rows = parse_all(&text, Some(base)).unwrap();
        assert_eq!(rows[0].local_time(), Some(base));
        assert_eq!(
            rows[1].local_time(),
            Some(base + TimeDelta::milliseconds(2250))
        );
    }

    #[test]
    fn local_time_past_the_calendar_is_an_error() {
        let base = parse_datetime("20170403153428").unwrap();
        let text = format!(
            "{HEADER}0.0 1.0 dd 7 W 202,1 10 512 0.5\n1e15 1e15 dd 7 W 202,1 18 512 0.5\n"
        );
        let err = parse_all(&text, Some(base)).unwrap_err();
        assert!(matches!(err, TraceError::LocalTimeOverflow { line: 3 }));

        // Without a base date the same rows are fine.
        assert_eq!(parse_all(&text, None).unwrap().len(), 2);
    }

    #[test]
    fn local_time_rejects_unrepresentable_offsets() {
        let base = parse_datetime("20170403153428").unwrap();
        assert_eq!(local_time(base, 1.5), Some(base + TimeDelta::milliseconds(1500)));
        assert_eq!(local_time(base, -1.0), Some(base - TimeDelta::seconds(1)));
        assert_eq!(local_time(base, 1.0e15), None);
        assert_eq!(local_time(base, f64::INFINITY), None);
        assert_eq!(local_time(base, f64::NAN), None);
    }

    #[test]
    fn columns_include_derived_fields() {
        let reporter = Recorder::new();
        let base = parse_datetime("20170403153428").unwrap();
        let mut parser = TraceParser::from_reader(HEADER.as_bytes(), Some(base), &reporter);
        assert!(parser.next().is_none());
        assert_eq!(
            parser.columns(),
            vec![
                "STARTs", "ENDs", "COMM", "PID", "TYPE", "DEV", "BLOCK", "BYTES", "LATms",
                "STARTs_DIFF", "STARTs_LOCAL_TIME"
            ]
        );
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let reporter = Recorder::new();
        let result = TraceParser::open("/definitely/not/here.log", None, &reporter);
        assert!(matches!(result, Err(TraceError::SourceUnavailable { .. })));
    }

    proptest! {
        #[test]
        fn one_row_per_data_line(
            starts in proptest::collection::vec(0.0f64..1.0e6, 0..40),
            blanks in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let mut text = String::from("Tracing block I/O. Ctrl-C to end.\n");
            text.push_str(HEADER);
            for (i, start) in starts.iter().enumerate() {
                if blanks[i] {
                    text.push('\n');
                }
                text.push_str(&format!(
                    "{:.6} {:.6} cmd {} R 8,0 {} 4096 1.25\n",
                    start,
                    start + 1.0,
                    i,
                    i
                ));
            }
            let rows = parse_all(&text, None).unwrap();
            prop_assert_eq!(rows.len(), starts.len());
            if let Some(first) = rows.first() {
                prop_assert_eq!(first.since_start(), Some(0.0));
            }
        }
    }
}
