use serde::Serialize;

/// Occurrence counts, `counts[latency_bucket][time_bucket]`.
///
/// Every bucket of both axes is present; cells with no rows hold zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    counts: Vec<Vec<u64>>,
    /// Rows whose latency or time fell outside the axes (e.g. below an
    /// explicit maximum).
    outside: usize,
}

impl Grid {
    pub fn new(latency_buckets: usize, time_buckets: usize) -> Self {
        Self {
            counts: vec![vec![0; time_buckets]; latency_buckets],
            outside: 0,
        }
    }

    pub fn increment(&mut self, latency: usize, time: usize) {
        self.counts[latency][time] += 1;
    }

    pub fn mark_outside(&mut self) {
        self.outside += 1;
    }

    pub fn get(&self, latency: usize, time: usize) -> Option<u64> {
        self.counts.get(latency)?.get(time).copied()
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn latency_buckets(&self) -> usize {
        self.counts.len()
    }

    pub fn time_buckets(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    pub fn outside(&self) -> usize {
        self.outside
    }

    /// Largest cell, used to share one colour scale across panels.
    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_are_zero() {
        let mut grid = Grid::new(3, 4);
        grid.increment(1, 2);
        grid.increment(1, 2);
        grid.increment(0, 3);

        assert_eq!(grid.latency_buckets(), 3);
        assert_eq!(grid.time_buckets(), 4);
        assert_eq!(grid.get(1, 2), Some(2));
        assert_eq!(grid.get(2, 0), Some(0));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.max_count(), 2);
        assert_eq!(grid.total(), 3);
    }
}
