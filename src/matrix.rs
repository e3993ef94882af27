//! Dense pairwise travel-cost matrix.

use serde::{Deserialize, Serialize};

/// Unit of the costs held by a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostMetric {
    /// Kilometers.
    Distance,
    /// Minutes.
    Duration,
}

/// An n×n travel-cost matrix stored in row-major order.
///
/// Cell `(from, to)` is the cost of traveling from location `from` to
/// location `to`. Unreachable pairs hold `f64::INFINITY`. The matrix is not
/// assumed symmetric: one-way streets make `(i, j)` and `(j, i)` differ.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
    metric: CostMetric,
}

impl CostMatrix {
    /// Creates a zero-filled matrix of the given size.
    pub fn new(size: usize, metric: CostMetric) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
            metric,
        }
    }

    /// Builds a matrix by evaluating `cost` for every (from, to) pair.
    pub fn from_fn(size: usize, metric: CostMetric, mut cost: impl FnMut(usize, usize) -> f64) -> Self {
        let mut matrix = Self::new(size, metric);
        for from in 0..size {
            for to in 0..size {
                matrix.set(from, to, cost(from, to));
            }
        }
        matrix
    }

    /// Builds a matrix from explicit rows.
    ///
    /// Returns `None` unless `rows` is square.
    pub fn from_rows(rows: Vec<Vec<f64>>, metric: CostMetric) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            data: rows.into_iter().flatten().collect(),
            size,
            metric,
        })
    }

    /// Cost from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, cost: f64) {
        self.data[from * self.size + to] = cost;
    }

    /// Number of locations.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn metric(&self) -> CostMetric {
        self.metric
    }

    /// Whether a finite-cost path exists from `from` to `to`.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.get(from, to).is_finite()
    }
}
