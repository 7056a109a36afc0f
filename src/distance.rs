//! Distance measures and the cached pairwise distance matrix.
//!
//! Every downstream stage (clustering, k-nearest-neighbor search, mesh
//! repair, projection) works purely on pairwise distances, so the full
//! N×N matrix is computed once per request and shared by reference.
//! Distances are not required to satisfy the triangle inequality; the
//! projection stages degrade gracefully on violations instead of assuming
//! true Euclidean geometry.

use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Pluggable measure between two feature vectors.
///
/// Implementations may be distances (lower is better) or similarities
/// (higher is better); `compare` encodes the direction so callers never
/// hardwire `<` or `>`.
pub trait DistanceMeasure {
    /// Measure between two feature vectors. Distances must be >= 0.
    fn measure(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64;

    /// Whether `x` is a better value than `y` under this measure.
    fn compare(&self, x: f64, y: f64) -> bool;

    /// Best possible value, for accumulator initialization.
    fn min_value(&self) -> f64;

    /// Worst possible value, for accumulator initialization.
    fn max_value(&self) -> f64;
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceMeasure for Euclidean {
    fn measure(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }

    fn compare(&self, x: f64, y: f64) -> bool {
        x < y
    }

    fn min_value(&self) -> f64 {
        0.0
    }

    fn max_value(&self) -> f64 {
        f64::INFINITY
    }
}

/// Cosine distance: `1 - cos(a, b)`, in `[0, 2]`.
///
/// Zero-norm vectors are treated as maximally dissimilar to everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl DistanceMeasure for Cosine {
    fn measure(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        let mut dot = 0.0;
        let mut na = 0.0;
        let mut nb = 0.0;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            return 1.0;
        }
        1.0 - dot / (na.sqrt() * nb.sqrt())
    }

    fn compare(&self, x: f64, y: f64) -> bool {
        x < y
    }

    fn min_value(&self) -> f64 {
        0.0
    }

    fn max_value(&self) -> f64 {
        2.0
    }
}

/// Symmetric N×N pairwise distance matrix with running min/max.
///
/// Immutable after the fill pass; N is fixed at creation. The running
/// min/max over all non-negative values ever set is reused later for
/// normalization. One instance belongs to exactly one request, never to
/// shared global state.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    values: Array2<f64>,
    n: usize,
    min: f64,
    max: f64,
}

impl DistanceMatrix {
    /// Create an empty matrix for `n` elements, all distances zero and
    /// min/max at their sentinels until values are set.
    pub fn new(n: usize) -> Self {
        Self {
            values: Array2::zeros((n, n)),
            n,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Build the full matrix from an `items × features` matrix, one
    /// `measure` call per unordered pair (O(N²)).
    pub fn from_features(features: ArrayView2<'_, f64>, measure: &dyn DistanceMeasure) -> Self {
        let n = features.nrows();
        let mut dmat = Self::new(n);

        #[cfg(feature = "parallel")]
        let rows: Vec<(usize, Vec<f64>)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let row = (i + 1..n)
                    .map(|j| measure.measure(features.row(i), features.row(j)))
                    .collect();
                (i, row)
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<(usize, Vec<f64>)> = (0..n)
            .map(|i| {
                let row = (i + 1..n)
                    .map(|j| measure.measure(features.row(i), features.row(j)))
                    .collect();
                (i, row)
            })
            .collect();

        for (i, row) in rows {
            for (offset, value) in row.into_iter().enumerate() {
                dmat.set_unchecked(i, i + 1 + offset, value);
            }
        }

        dmat
    }

    /// Set the distance between `i` and `j`, stored symmetrically.
    /// Negative values are stored but excluded from the running min/max.
    pub fn set_distance(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.check(i)?;
        self.check(j)?;
        self.set_unchecked(i, j, value);
        Ok(())
    }

    fn set_unchecked(&mut self, i: usize, j: usize, value: f64) {
        self.values[[i, j]] = value;
        self.values[[j, i]] = value;

        if value >= 0.0 {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
    }

    /// Distance between `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        self.check(i)?;
        self.check(j)?;
        Ok(self.values[[i, j]])
    }

    /// Unchecked access for hot loops over already-validated indices.
    #[inline]
    pub(crate) fn dist(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Largest non-negative value ever set.
    pub fn max_distance(&self) -> f64 {
        self.max
    }

    /// Smallest non-negative value ever set.
    pub fn min_distance(&self) -> f64 {
        self.min
    }

    /// Number of elements N.
    pub fn element_count(&self) -> usize {
        self.n
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.n {
            return Err(Error::InvalidIndex {
                index,
                count: self.n,
            });
        }
        Ok(())
    }
}
