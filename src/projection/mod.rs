//! Multidimensional projection: from pairwise distances to a 2D layout.
//!
//! The stages, in pipeline order:
//!
//! 1. [`nnp`] — incremental geometric placement of the control points
//! 2. [`force::ForceScheme`] — iterative relaxation of that placement
//! 3. [`knn::KnnSearch`] — exhaustive k-nearest neighbors over all items
//! 4. [`mesh::connect`] — connectivity repair of the neighbor graph
//! 5. [`solver::ProjectionSolver`] — the orchestrator: interpolates all N
//!    coordinates from the control layout via a least-squares solve over
//!    the repaired mesh
//!
//! Everything here is synchronous, CPU-bound, and request-local; construct
//! the pieces fresh per request instead of sharing them across threads.

pub mod force;
pub mod knn;
pub mod mesh;
pub mod nnp;
pub mod solver;

pub use force::ForceScheme;
pub use knn::{KnnSearch, NeighborTable, Pair};
pub use solver::ProjectionSolver;
