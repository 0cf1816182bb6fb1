//! Half-open bucket boundaries for the heatmap axes.

use crate::trace::parse::local_time;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Upper bound on the number of buckets along one axis.
pub const MAX_BUCKETS: usize = 100_000;

/// Contiguous `[edge[i], edge[i + 1])` intervals of equal width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Buckets {
    edges: Vec<f64>,
    width: f64,
}

impl Buckets {
    /// Edges `start, start + width, ...` up to and including `end` when it
    /// lands on a multiple of `width`. At least one bucket is produced.
    ///
    /// `width` must be positive and finite. Returns `None` when the range is
    /// not finite or would need more than [`MAX_BUCKETS`] buckets.
    pub fn interval_range(start: f64, end: f64, width: f64) -> Option<Self> {
        // Tolerate rounding so that e.g. 6.0 / 0.5 still yields 12 buckets.
        let span = (end - start) / width;
        if !span.is_finite() {
            return None;
        }
        let count = (span + 1e-9).floor().max(1.0);
        if count > MAX_BUCKETS as f64 {
            return None;
        }
        let count = count as usize;
        let edges = (0..=count).map(|i| start + i as f64 * width).collect();
        Some(Self { edges, width })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Number of buckets (one less than the number of edges).
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self) -> f64 {
        self.edges[0]
    }

    pub fn end(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Bucket index holding `value`, left edge inclusive.
    pub fn locate(&self, value: f64) -> Option<usize> {
        if !(value >= self.start() && value < self.end()) {
            return None;
        }
        Some(self.edges.partition_point(|e| *e <= value) - 1)
    }
}

/// Time axis: seconds since the first row, or since the base date when one is
/// configured.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub buckets: Buckets,
    pub origin: Option<NaiveDateTime>,
}

impl TimeAxis {
    /// Left edge of bucket `i` as wall-clock time (local-time mode only).
    pub fn local_edge(&self, i: usize) -> Option<NaiveDateTime> {
        let origin = self.origin?;
        let seconds = *self.buckets.edges().get(i)?;
        local_time(origin, seconds)
    }
}

/// The interval actually used when the configured one exceeds the observed
/// maximum. The divisors are inherited behaviour and kept as-is.
pub fn shrink_interval(interval: f64, max: f64, divisor: f64) -> f64 {
    if interval > max && max > 0.0 {
        max / divisor
    } else {
        interval
    }
}
