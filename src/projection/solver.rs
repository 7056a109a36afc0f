//! Full-set projection: anchor a handful of control points geometrically,
//! then interpolate everything else with a sparse local-smoothness solve.
//!
//! Running force relaxation over all N items would cost O(N²) per sweep.
//! Instead only the k control points (the cluster medoids) get the
//! expensive treatment — nearest-neighbor placement refined by force
//! sweeps — and the remaining items are positioned by requiring each to
//! sit at the inverse-distance-weighted average of its mesh neighbors,
//! with the control points pinned. That is one least-squares system per
//! coordinate axis, reduced via normal equations (`AᵗA x = AᵗB`) and
//! factorized with Cholesky; `AᵗA` is positive definite whenever the
//! repaired mesh is connected, which the repair stage guarantees.
//!
//! The system is assembled densely: the caller caps N at a few hundred
//! search hits, where a dense N×N solve is cheaper than sparse bookkeeping.

use std::time::Instant;

use faer::prelude::*;
use faer::{Mat, Side};
use tracing::debug;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::projection::force::ForceScheme;
use crate::projection::knn::{KnnSearch, NeighborTable};
use crate::projection::{mesh, nnp};

/// Orchestrator for the control-point projection pipeline.
#[derive(Debug, Clone)]
pub struct ProjectionSolver {
    force_iterations: usize,
    num_neighbors: usize,
    fraction_delta: f64,
}

impl Default for ProjectionSolver {
    fn default() -> Self {
        Self {
            force_iterations: 50,
            num_neighbors: 2,
            fraction_delta: 0.8,
        }
    }
}

impl ProjectionSolver {
    /// Solver with default settings (50 force sweeps, 2 neighbors).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of force-relaxation sweeps over the control layout.
    pub fn with_force_iterations(mut self, iterations: usize) -> Self {
        self.force_iterations = iterations;
        self
    }

    /// Set the neighbor count for the full-set mesh.
    pub fn with_num_neighbors(mut self, num_neighbors: usize) -> Self {
        self.num_neighbors = num_neighbors;
        self
    }

    /// Set the force-step damping divisor.
    pub fn with_fraction_delta(mut self, fraction_delta: f64) -> Self {
        self.fraction_delta = fraction_delta;
        self
    }

    /// Project all N items of `dmat` into 2D, anchored on `control_points`.
    ///
    /// Returns the N coordinates (control points exactly at their relaxed
    /// positions) and the repaired neighbor table. An empty control set
    /// yields an empty projection. A non-positive-definite system surfaces
    /// as [`Error::NumericalFailure`]; retrying with more neighbors is the
    /// usual remedy.
    pub fn project(
        &self,
        dmat: &DistanceMatrix,
        control_points: &[usize],
    ) -> Result<(Vec<[f64; 2]>, NeighborTable)> {
        let n = dmat.element_count();
        let k = control_points.len();

        if k == 0 {
            return Ok((Vec::new(), NeighborTable::empty(n)));
        }
        for &cp in control_points {
            if cp >= n {
                return Err(Error::InvalidIndex {
                    index: cp,
                    count: n,
                });
            }
        }
        if n == 1 {
            return Ok((vec![[0.0, 0.0]], NeighborTable::empty(1)));
        }

        // Control-point sub-matrix, then the expensive geometric pass.
        let sub = control_submatrix(dmat, control_points)?;
        let mut control_coords = nnp::project(&sub);

        let force = ForceScheme::new(self.fraction_delta, k);
        for _ in 0..self.force_iterations {
            force.iteration(&sub, &mut control_coords);
        }

        // Full-set mesh: exact kNN, then connectivity repair.
        let table = KnnSearch::new(self.num_neighbors).execute(dmat)?;
        let table = mesh::connect(table, dmat);

        let mut coords = self.solve(dmat, &table, control_points, &control_coords)?;

        // Pin the control points to their relaxed positions exactly.
        for (pos, &cp) in control_points.iter().enumerate() {
            coords[cp] = control_coords[pos];
        }

        Ok((coords, table))
    }

    /// Assemble and solve the least-squares system, one coordinate column
    /// at a time (x and y share the factorization).
    fn solve(
        &self,
        dmat: &DistanceMatrix,
        table: &NeighborTable,
        control_points: &[usize],
        control_coords: &[[f64; 2]],
    ) -> Result<Vec<[f64; 2]>> {
        let n = dmat.element_count();

        let mut control_pos = vec![None; n];
        for (pos, &cp) in control_points.iter().enumerate() {
            control_pos[cp] = Some(pos);
        }

        let mut a = Mat::<f64>::zeros(n, n);
        let mut b = Mat::<f64>::zeros(n, 2);

        for i in 0..n {
            a[(i, i)] = 1.0;

            if let Some(pos) = control_pos[i] {
                // Hard constraint: pin to the relaxed control layout.
                b[(i, 0)] = control_coords[pos][0];
                b[(i, 1)] = control_coords[pos][1];
                continue;
            }

            // Smoothness row: i sits at the inverse-distance-weighted
            // average of its repaired neighbor set. Neighbor distances are
            // rescaled into [0.1, 1.0] within the row so one near-duplicate
            // neighbor cannot swamp the rest.
            let neighbors = table.neighbors(i);
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for pair in neighbors {
                min = min.min(pair.distance);
                max = max.max(pair.distance);
            }

            if max > min {
                let sum: f64 = neighbors
                    .iter()
                    .map(|p| 1.0 / ((p.distance - min) / (max - min) * 0.9 + 0.1))
                    .sum();
                for pair in neighbors {
                    let scaled = (pair.distance - min) / (max - min) * 0.9 + 0.1;
                    a[(i, pair.index)] = -(1.0 / scaled / sum);
                }
            } else {
                for pair in neighbors {
                    a[(i, pair.index)] = -1.0 / neighbors.len() as f64;
                }
            }
        }

        let start = Instant::now();
        let at = a.as_ref().transpose();
        let ata = at * a.as_ref();
        let atb = at * b.as_ref();

        let llt = ata.llt(Side::Lower).map_err(|_| Error::NumericalFailure {
            stage: "cholesky factorization of the layout system",
        })?;
        let solution = llt.solve(&atb);

        debug!(
            elapsed_s = start.elapsed().as_secs_f32(),
            n,
            k = control_points.len(),
            "solved layout system"
        );

        Ok((0..n).map(|i| [solution[(i, 0)], solution[(i, 1)]]).collect())
    }
}

/// Distance matrix restricted to the control points, index-aligned to
/// their order in `control_points`.
fn control_submatrix(dmat: &DistanceMatrix, control_points: &[usize]) -> Result<DistanceMatrix> {
    let k = control_points.len();
    let mut sub = DistanceMatrix::new(k);
    for i in 0..k {
        for j in (i + 1)..k {
            sub.set_distance(i, j, dmat.dist(control_points[i], control_points[j]))?;
        }
    }
    Ok(sub)
}
