//! Force-directed relaxation of a 2D layout toward target distances.
//!
//! Each `iteration` call is one sweep over every ordered pair of points in
//! a fixed stride-based visitation order. The order is a permutation
//! computed once at construction, striding through the remaining indices
//! rather than walking 0..n, so a sweep touches the layout globally instead
//! of churning one neighborhood at a time.
//!
//! The update is intentionally asymmetric: for each visited pair only the
//! **second** point moves, by a signed quadratic step toward the
//! min/max-normalized target distance. Symmetrizing the update changes the
//! convergence behavior, so it stays as is. There is no internal stopping
//! rule; the caller drives a fixed number of sweeps and may watch the
//! returned mean absolute step for early termination.

use crate::distance::DistanceMatrix;

const EPSILON: f64 = 1e-7;

/// One-layout force relaxer. Construct fresh per layout: the visitation
/// order is derived from the point count and fixed thereafter.
#[derive(Debug, Clone)]
pub struct ForceScheme {
    fraction_delta: f64,
    order: Vec<usize>,
}

impl ForceScheme {
    /// Create a relaxer for `n_points` points. `fraction_delta` divides
    /// every step; larger values mean gentler moves.
    pub fn new(fraction_delta: f64, n_points: usize) -> Self {
        // Stride through the shrinking pool of unvisited indices, jumping
        // a tenth of the remainder each pick.
        let mut pool: Vec<usize> = (0..n_points).collect();
        let mut order = Vec::with_capacity(n_points);
        let mut at = 0usize;
        for _ in 0..n_points {
            if at >= pool.len() {
                at = 0;
            }
            order.push(pool.remove(at));
            at += pool.len() / 10;
        }

        Self {
            fraction_delta,
            order,
        }
    }

    /// The fixed visitation order (a permutation of `0..n`).
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Run one relaxation sweep over `coords`, returning the mean absolute
    /// step as an error signal.
    ///
    /// Coincident points are clamped to an epsilon gap, never divided by
    /// zero. Targets are `(raw - min) / (max - min)` over the matrix's
    /// running extrema.
    pub fn iteration(&self, dmat: &DistanceMatrix, coords: &mut [[f64; 2]]) -> f64 {
        let n = coords.len();
        if n < 2 {
            return 0.0;
        }
        debug_assert_eq!(n, self.order.len());

        let min = dmat.min_distance();
        let range = dmat.max_distance() - min;
        let mut error = 0.0;

        for &instance in &self.order {
            for &other in &self.order {
                if instance == other {
                    continue;
                }

                let dx = coords[other][0] - coords[instance][0];
                let dy = coords[other][1] - coords[instance][1];
                let gap = (dx * dx + dy * dy).sqrt().max(EPSILON);

                let raw = dmat.dist(instance, other);
                let target = if range > 0.0 { (raw - min) / range } else { 0.0 };

                let mut delta = target - gap;
                delta *= delta.abs();
                delta /= self.fraction_delta;
                error += delta.abs();

                // Only the second point of the pair moves.
                coords[other][0] += delta * (dx / gap);
                coords[other][1] += delta * (dy / gap);
            }
        }

        error / (n * n - n) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceMatrix, Euclidean};
    use ndarray::array;

    fn layout_stress(dmat: &DistanceMatrix, coords: &[[f64; 2]]) -> f64 {
        let min = dmat.min_distance();
        let range = dmat.max_distance() - min;
        let n = coords.len();
        let mut stress = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let gap = ((coords[i][0] - coords[j][0]).powi(2)
                    + (coords[i][1] - coords[j][1]).powi(2))
                .sqrt();
                let target = (dmat.dist(i, j) - min) / range;
                stress += (gap - target) * (gap - target);
            }
        }
        stress
    }

    #[test]
    fn test_order_is_permutation() {
        for n in [1usize, 2, 7, 23, 50] {
            let mut order = ForceScheme::new(0.8, n).order().to_vec();
            order.sort_unstable();
            assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_order_is_not_identity_for_larger_n() {
        let order = ForceScheme::new(0.8, 30).order().to_vec();
        assert_ne!(order, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_coincident_points_no_nan() {
        let features = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let dmat = DistanceMatrix::from_features(features.view(), &Euclidean);

        // All three points stacked on one spot.
        let mut coords = vec![[0.5, 0.5]; 3];
        let force = ForceScheme::new(0.8, 3);
        let error = force.iteration(&dmat, &mut coords);

        assert!(error.is_finite());
        for p in &coords {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn test_relaxation_reduces_stress() {
        let features = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.5]];
        let dmat = DistanceMatrix::from_features(features.view(), &Euclidean);

        // Deliberately bad starting layout.
        let mut coords = vec![
            [0.0, 0.0],
            [0.01, 0.0],
            [0.02, 0.0],
            [0.03, 0.0],
            [0.04, 0.0],
        ];
        let force = ForceScheme::new(0.8, 5);

        let before = layout_stress(&dmat, &coords);
        for _ in 0..50 {
            force.iteration(&dmat, &mut coords);
        }
        let after = layout_stress(&dmat, &coords);

        assert!(after < before, "stress went from {before} to {after}");
    }

    #[test]
    fn test_single_point_is_noop() {
        let dmat = DistanceMatrix::new(1);
        let mut coords = vec![[0.3, 0.7]];
        let force = ForceScheme::new(0.8, 1);
        assert_eq!(force.iteration(&dmat, &mut coords), 0.0);
        assert_eq!(coords, vec![[0.3, 0.7]]);
    }
}
