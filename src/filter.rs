//! Row filters built from the command line options.
//!
//! Predicates only decide inclusion. The column subset is a separate
//! projection applied to rows that survived every predicate, so a predicate
//! never sees a pruned row.

use crate::error::TraceError;
use crate::trace::Row;
use crate::trace::columns::{COMMAND, DEVICE_ID, IO_TYPE, PROCESS_ID, START_TIME_STAMP_DIFF};

/// Filter options, each one optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    pub since: Option<f64>,
    pub until: Option<f64>,
    pub columns: Vec<String>,
    pub commands: Vec<String>,
    pub device: Option<String>,
    pub pids: Vec<i64>,
    pub types: Vec<String>,
}

/// A single row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `STARTs_DIFF >= threshold`
    Since(f64),
    /// `STARTs_DIFF <= threshold`
    Until(f64),
    /// Any configured name is a substring of `COMM`.
    Commands(Vec<String>),
    /// `DEV` equals the value.
    Device(String),
    Pids(Vec<i64>),
    Types(Vec<String>),
}

impl Filter {
    /// A row lacking the inspected column never matches.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Since(since) => row.since_start().is_some_and(|diff| *since <= diff),
            Filter::Until(until) => row.since_start().is_some_and(|diff| diff <= *until),
            Filter::Commands(commands) => row
                .get(COMMAND)
                .and_then(|v| v.as_str())
                .is_some_and(|comm| commands.iter().any(|c| comm.contains(c.as_str()))),
            Filter::Device(device) => row
                .get(DEVICE_ID)
                .and_then(|v| v.as_str())
                .is_some_and(|dev| dev == device),
            Filter::Pids(pids) => row
                .get(PROCESS_ID)
                .and_then(|v| v.as_int())
                .is_some_and(|pid| pids.contains(&pid)),
            Filter::Types(types) => row
                .get(IO_TYPE)
                .and_then(|v| v.as_str())
                .is_some_and(|t| types.iter().any(|x| x == t)),
        }
    }
}

/// Keeps a subset of columns. `STARTs_DIFF` is always kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    keep: Vec<String>,
}

impl Projection {
    pub fn new(columns: &[String]) -> Self {
        let mut keep = columns.to_vec();
        if !keep.iter().any(|c| c == START_TIME_STAMP_DIFF) {
            keep.insert(0, START_TIME_STAMP_DIFF.to_string());
        }
        Self { keep }
    }

    pub fn keeps(&self, column: &str) -> bool {
        self.keep.iter().any(|c| c == column)
    }

    pub fn apply(&self, mut row: Row) -> Row {
        row.retain(|column| self.keeps(column));
        row
    }
}

/// Ordered predicates plus an optional projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
    projection: Option<Projection>,
}

impl FilterChain {
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut filters = Vec::new();
        if let Some(since) = config.since {
            filters.push(Filter::Since(since));
        }
        if let Some(until) = config.until {
            filters.push(Filter::Until(until));
        }
        if !config.commands.is_empty() {
            filters.push(Filter::Commands(config.commands.clone()));
        }
        if let Some(device) = &config.device {
            filters.push(Filter::Device(device.clone()));
        }
        if !config.pids.is_empty() {
            filters.push(Filter::Pids(config.pids.clone()));
        }
        if !config.types.is_empty() {
            filters.push(Filter::Types(config.types.clone()));
        }

        let projection = (!config.columns.is_empty()).then(|| Projection::new(&config.columns));

        Self {
            filters,
            projection,
        }
    }

    pub fn new(filters: Vec<Filter>, projection: Option<Projection>) -> Self {
        Self {
            filters,
            projection,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Logical AND over the predicates, stopping at the first failure.
    pub fn passes(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    pub fn project(&self, row: Row) -> Row {
        match &self.projection {
            Some(projection) => projection.apply(row),
            None => row,
        }
    }

    /// Rows passing every predicate, unprojected. Errors pass through.
    pub fn select<'c, I>(
        &'c self,
        rows: I,
    ) -> impl Iterator<Item = Result<Row, TraceError>> + 'c
    where
        I: Iterator<Item = Result<Row, TraceError>> + 'c,
    {
        rows.filter(move |r| r.as_ref().map_or(true, |row| self.passes(row)))
    }

    /// Rows passing every predicate, projected to the configured columns.
    pub fn apply<'c, I>(
        &'c self,
        rows: I,
    ) -> impl Iterator<Item = Result<Row, TraceError>> + 'c
    where
        I: Iterator<Item = Result<Row, TraceError>> + 'c,
    {
        self.select(rows).map(move |r| r.map(|row| self.project(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Value;
    use crate::trace::columns::{IO_LATENCY, START_TIME_STAMP};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn row(diff: f64, comm: &str, pid: i64, kind: &str, dev: &str) -> Row {
        [
            (START_TIME_STAMP, Value::Float(100.0 + diff)),
            (COMMAND, Value::Str(comm.into())),
            (PROCESS_ID, Value::Int(pid)),
            (IO_TYPE, Value::Str(kind.into())),
            (DEVICE_ID, Value::Str(dev.into())),
            (IO_LATENCY, Value::Float(1.0)),
            (START_TIME_STAMP_DIFF, Value::Float(diff)),
        ]
        .into_iter()
        .collect()
    }

    fn surviving(chain: &FilterChain, rows: &[Row]) -> Vec<f64> {
        rows.iter()
            .filter(|r| chain.passes(r))
            .filter_map(Row::since_start)
            .collect()
    }

    #[test]
    fn since_keeps_later_rows() {
        let chain = FilterChain::from_config(&FilterConfig {
            since: Some(10.0),
            ..Default::default()
        });
        let rows = vec![
            row(0.0, "bash", 1, "R", "8,0"),
            row(5.5, "bash", 1, "R", "8,0"),
            row(12.0, "bash", 1, "R", "8,0"),
        ];
        assert_eq!(surviving(&chain, &rows), vec![12.0]);
    }

    #[test]
    fn until_is_inclusive() {
        let chain = FilterChain::from_config(&FilterConfig {
            until: Some(5.5),
            ..Default::default()
        });
        let rows = vec![
            row(0.0, "a", 1, "R", "d"),
            row(5.5, "a", 1, "R", "d"),
            row(6.0, "a", 1, "R", "d"),
        ];
        assert_eq!(surviving(&chain, &rows), vec![0.0, 5.5]);
    }

    #[test]
    fn commands_match_by_substring() {
        let filter = Filter::Commands(vec!["kworker".into(), "jbd".into()]);
        assert!(filter.matches(&row(0.0, "kworker/0:1", 1, "R", "d")));
        assert!(filter.matches(&row(0.0, "jbd2/sda1-8", 1, "R", "d")));
        assert!(!filter.matches(&row(0.0, "bash", 1, "R", "d")));
    }

    #[test]
    fn device_pid_and_type_filters() {
        let r = row(0.0, "dd", 42, "W", "202,1");
        assert!(Filter::Device("202,1".into()).matches(&r));
        assert!(!Filter::Device("202".into()).matches(&r));
        assert!(Filter::Pids(vec![1, 42]).matches(&r));
        assert!(!Filter::Pids(vec![1]).matches(&r));
        assert!(Filter::Types(vec!["R".into(), "W".into()]).matches(&r));
        assert!(!Filter::Types(vec!["RM".into()]).matches(&r));
    }

    #[test]
    fn missing_column_rejects_row() {
        let r: Row = [(START_TIME_STAMP_DIFF, Value::Float(0.0))].into_iter().collect();
        assert!(!Filter::Device("8,0".into()).matches(&r));
        assert!(Filter::Since(0.0).matches(&r));
    }

    #[test]
    fn chain_follows_config_order() {
        let chain = FilterChain::from_config(&FilterConfig {
            since: Some(1.0),
            until: Some(2.0),
            columns: vec!["COMM".into()],
            commands: vec!["dd".into()],
            device: Some("8,0".into()),
            pids: vec![7],
            types: vec!["R".into()],
        });
        assert_eq!(
            chain.filters(),
            &[
                Filter::Since(1.0),
                Filter::Until(2.0),
                Filter::Commands(vec!["dd".into()]),
                Filter::Device("8,0".into()),
                Filter::Pids(vec![7]),
                Filter::Types(vec!["R".into()]),
            ]
        );
        assert!(chain.projection().is_some());
    }

    #[test]
    fn empty_config_passes_everything() {
        let chain = FilterChain::from_config(&FilterConfig::default());
        assert!(chain.filters().is_empty());
        assert!(chain.passes(&row(0.0, "a", 1, "R", "d")));
    }

    #[test]
    fn projection_keeps_relative_time() {
        let projection = Projection::new(&["COMM".to_string(), "PID".to_string()]);
        let projected = projection.apply(row(3.0, "dd", 7, "R", "8,0"));
        let columns: Vec<&str> = projected.columns().collect();
        assert_eq!(columns, vec!["COMM", "PID", "STARTs_DIFF"]);
    }

    #[test]
    fn projection_runs_after_predicates() {
        // DEV is pruned from the output, yet the device predicate still sees it.
        let chain = FilterChain::from_config(&FilterConfig {
            columns: vec!["COMM".into()],
            device: Some("8,0".into()),
            ..Default::default()
        });
        let rows = vec![
            Ok(row(0.0, "dd", 7, "R", "8,0")),
            Ok(row(1.0, "cp", 8, "R", "8,16")),
        ];
        let out: Vec<Row> = chain.apply(rows.into_iter()).collect::<Result<_, _>>().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(COMMAND), Some(&Value::Str("dd".into())));
        assert!(!out[0].contains(DEVICE_ID));
    }

    #[test]
    fn pruning_before_a_predicate_would_reject() {
        // The order-sensitive case: had the subset been applied first, the
        // device predicate would find no DEV column and drop the row.
        let r = row(0.0, "dd", 7, "R", "8,0");
        let pruned = Projection::new(&["COMM".to_string()]).apply(r.clone());
        let device = Filter::Device("8,0".into());
        assert!(device.matches(&r));
        assert!(!device.matches(&pruned));
    }

    fn arb_filter() -> impl Strategy<Value = Filter> {
        prop_oneof![
            (0.0f64..20.0).prop_map(Filter::Since),
            (0.0f64..20.0).prop_map(Filter::Until),
            proptest::sample::subsequence(vec!["dd", "cp", "kworker"], 1..3)
                .prop_map(|v| Filter::Commands(v.into_iter().map(String::from).collect())),
            proptest::sample::select(vec!["8,0", "8,16"]).prop_map(|d| Filter::Device(d.into())),
            proptest::collection::vec(1i64..5, 1..3).prop_map(Filter::Pids),
            proptest::sample::subsequence(vec!["R", "W", "RM"], 1..3)
                .prop_map(|v| Filter::Types(v.into_iter().map(String::from).collect())),
        ]
    }

    fn arb_row() -> impl Strategy<Value = Row> {
        (
            0.0f64..20.0,
            proptest::sample::select(vec!["dd", "cp", "kworker/1:0"]),
            1i64..5,
            proptest::sample::select(vec!["R", "W", "RM"]),
            proptest::sample::select(vec!["8,0", "8,16"]),
        )
            .prop_map(|(diff, comm, pid, kind, dev)| row(diff, comm, pid, kind, dev))
    }

    proptest! {
        #[test]
        fn predicate_order_does_not_matter(
            a in arb_filter(),
            b in arb_filter(),
            rows in proptest::collection::vec(arb_row(), 0..30),
        ) {
            let ab = FilterChain::new(vec![a.clone(), b.clone()], None);
            let ba = FilterChain::new(vec![b, a], None);
            prop_assert_eq!(surviving(&ab, &rows), surviving(&ba, &rows));
        }
    }
}
