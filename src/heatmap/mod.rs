//! Latency-over-time binning.
//!
//! The latency axis runs from 0 to the maximum latency plus two intervals of
//! slack; the time axis from 0 (or the base date) to the maximum time plus one
//! interval. Both are split into half-open buckets and every row increments
//! one `(latency, time)` cell.

pub mod bins;
pub mod condition;
pub mod grid;

pub use bins::{Buckets, TimeAxis};
pub use condition::{CmpOp, Condition};
pub use grid::Grid;

use crate::error::BinError;
use crate::report::Reporter;
use crate::trace::Row;
use crate::trace::parse::local_time;
use bins::shrink_interval;
use chrono::NaiveDateTime;
use std::fmt::Write as _;

/// Axis settings for the heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    /// Time bucket width in seconds.
    pub x_interval: f64,
    /// Upper end of the time axis, in seconds from the origin.
    pub x_max: Option<f64>,
    /// Latency bucket width in milliseconds.
    pub y_interval: f64,
    pub y_max: Option<f64>,
    /// Switches the time axis to wall-clock time.
    pub base_date: Option<NaiveDateTime>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            x_interval: 1.0,
            x_max: None,
            y_interval: 50.0,
            y_max: None,
            base_date: None,
        }
    }
}

/// Upper bound on `latency buckets × time buckets`.
pub const MAX_CELLS: usize = 10_000_000;

/// Axes computed once from the full row set, reused for every partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Binner {
    latency: Buckets,
    time: TimeAxis,
}

impl Binner {
    /// Compute both axes. Callers are expected to skip binning entirely when
    /// there are no rows; an empty slice is rejected.
    ///
    /// Maxima must be finite, and each axis holds at most [`bins::MAX_BUCKETS`]
    /// buckets and the grid at most [`MAX_CELLS`] cells.
    pub fn new(
        rows: &[Row],
        config: &HeatmapConfig,
        reporter: &dyn Reporter,
    ) -> Result<Self, BinError> {
        if rows.is_empty() {
            return Err(BinError::EmptyRows);
        }
        check_interval("y", config.y_interval)?;
        check_interval("x", config.x_interval)?;

        let latency = latency_buckets(rows, config, reporter)?;
        let time = match config.base_date {
            None => relative_time_axis(rows, config, reporter)?,
            Some(base) => local_time_axis(rows, base, config, reporter)?,
        };

        let cells = latency.len().saturating_mul(time.buckets.len());
        if cells > MAX_CELLS {
            return Err(BinError::GridTooLarge { cells });
        }
        Ok(Self { latency, time })
    }

    pub fn latency_buckets(&self) -> &Buckets {
        &self.latency
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Count rows per cell. Rows outside either axis are tallied separately.
    pub fn bin<'r>(&self, rows: impl IntoIterator<Item = &'r Row>) -> Grid {
        let mut grid = Grid::new(self.latency.len(), self.time.buckets.len());
        for row in rows {
            let cell = row
                .latency()
                .and_then(|lat| self.latency.locate(lat))
                .zip(self.time_of(row).and_then(|t| self.time.buckets.locate(t)));
            match cell {
                Some((lat, t)) => grid.increment(lat, t),
                None => grid.mark_outside(),
            }
        }
        grid
    }

    /// Position of `row` on the time axis, in seconds from the axis origin.
    fn time_of(&self, row: &Row) -> Option<f64> {
        match self.time.origin {
            None => row.since_start(),
            Some(origin) => row.local_time().and_then(|t| seconds_between(origin, t)),
        }
    }

    /// Text table of a grid for debug output.
    pub fn describe(&self, grid: &Grid) -> String {
        let mut out = String::new();
        let _ = write!(out, "{:>12}", "LATms\\time");
        for edge in &self.time.buckets.edges()[..self.time.buckets.len()] {
            let _ = write!(out, " {:>8.2}", edge);
        }
        out.push('\n');
        for (i, counts) in grid.counts().iter().enumerate() {
            let _ = write!(out, "{:>12.2}", self.latency.edges()[i]);
            for count in counts {
                let _ = write!(out, " {:>8}", count);
            }
            out.push('\n');
        }
        out
    }
}

fn check_interval(axis: &'static str, interval: f64) -> Result<(), BinError> {
    if interval.is_finite() && interval > 0.0 {
        Ok(())
    } else {
        Err(BinError::InvalidInterval { axis, interval })
    }
}

fn check_max(axis: &'static str, max: f64) -> Result<f64, BinError> {
    if max.is_finite() {
        Ok(max)
    } else {
        Err(BinError::MaxOutOfRange { axis, max })
    }
}

/// `[0, max + slack × width)` split into buckets of `width`.
fn axis_buckets(
    axis: &'static str,
    max: f64,
    slack: f64,
    width: f64,
) -> Result<Buckets, BinError> {
    Buckets::interval_range(0.0, max + slack * width, width)
        .ok_or(BinError::TooManyBuckets { axis, max, width })
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

fn seconds_between(origin: NaiveDateTime, t: NaiveDateTime) -> Option<f64> {
    (t - origin)
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
}

fn latency_buckets(
    rows: &[Row],
    config: &HeatmapConfig,
    reporter: &dyn Reporter,
) -> Result<Buckets, BinError> {
    let max = config
        .y_max
        .unwrap_or_else(|| max_of(rows.iter().filter_map(Row::latency)));
    let max = check_max("y", max)?;
    reporter.info(&format!("maximum io latency: {:.6}", max));

    let width = shrink_interval(config.y_interval, max, 10.0);
    axis_buckets("y", max, 2.0, width)
}

fn relative_time_axis(
    rows: &[Row],
    config: &HeatmapConfig,
    reporter: &dyn Reporter,
) -> Result<TimeAxis, BinError> {
    let max = config
        .x_max
        .unwrap_or_else(|| max_of(rows.iter().filter_map(Row::since_start)));
    let max = check_max("x", max)?;
    reporter.info(&format!("maximum time stamp diff: {:.6}", max));

    let width = shrink_interval(config.x_interval, max, 100.0);
    Ok(TimeAxis {
        buckets: axis_buckets("x", max, 1.0, width)?,
        origin: None,
    })
}

fn local_time_axis(
    rows: &[Row],
    base: NaiveDateTime,
    config: &HeatmapConfig,
    reporter: &dyn Reporter,
) -> Result<TimeAxis, BinError> {
    // Offsets from the base date.
    let max = config.x_max.unwrap_or_else(|| {
        max_of(
            rows.iter()
                .filter_map(Row::local_time)
                .filter_map(|t| seconds_between(base, t)),
        )
    });
    let max = check_max("x", max)?;
    let last = local_time(base, max).ok_or(BinError::MaxOutOfRange { axis: "x", max })?;
    reporter.info(&format!("maximum localtime: {}", last));

    // Unlike the relative axis, the shrink divides the interval itself.
    let width = if config.x_interval > max {
        config.x_interval / 100.0
    } else {
        config.x_interval
    };
    Ok(TimeAxis {
        buckets: axis_buckets("x", max, 1.0, width)?,
        origin: Some(base),
    })
}
