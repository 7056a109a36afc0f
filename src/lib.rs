//! # carto
//!
//! Medoid clustering + multidimensional projection engine for visual
//! exploration of scored document sets.
//!
//! Given N items with feature vectors and a pluggable distance measure,
//! `carto` produces a k-way partition with term labels and a 2D coordinate
//! plus neighbor list per item. The pipeline: a cached pairwise
//! [`DistanceMatrix`], PAM-style [`MedoidClusterer`] to pick control
//! points, nearest-neighbor placement refined by force relaxation for the
//! control layout, and a Cholesky-backed least-squares solve over the
//! repaired kNN mesh to interpolate everything else.
//!
//! Everything is synchronous and request-local. Cap N before calling (a
//! few hundred items is the intended scale) and allocate fresh instances
//! per request; nothing here is meant to be shared mutable state.
//!
//! ```rust
//! use carto::{layout, Cosine, EngineConfig};
//! use ndarray::Array2;
//!
//! let features = Array2::from_shape_vec((4, 3), vec![
//!     1.0, 0.0, 0.0,
//!     0.9, 0.1, 0.0,
//!     0.0, 1.0, 0.0,
//!     0.1, 0.9, 0.0,
//! ]).unwrap();
//!
//! let config = EngineConfig { num_clusters: 2, num_neighbors: 2, ..Default::default() };
//! let result = layout(features.view(), &Cosine, &config).unwrap();
//! assert_eq!(result.coordinates.len(), 4);
//! ```

pub mod cluster;
pub mod distance;
/// Error types used across `carto`.
pub mod error;
pub mod engine;
pub mod projection;

pub use cluster::{cluster_labels, Cluster, MedoidClusterer, MedoidClustering, MedoidInit};
pub use distance::{Cosine, DistanceMatrix, DistanceMeasure, Euclidean};
pub use engine::{label_terms, layout, EngineConfig, Layout};
pub use error::{Error, Result};
pub use projection::{ForceScheme, KnnSearch, NeighborTable, Pair, ProjectionSolver};
