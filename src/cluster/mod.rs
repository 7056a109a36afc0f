//! Partitional clustering of scored documents.
//!
//! One canonical k-medoid (PAM) implementation with an injectable
//! initialization policy; the medoids double as the control points that
//! anchor the projection stage.
//!
//! ## Medoids vs centroids
//!
//! A centroid is a synthetic mean vector; a **medoid** is a real member of
//! the cluster. Working with medoids keeps everything in distance-matrix
//! space — no feature arithmetic — and gives the projection stage concrete
//! items to anchor, which is exactly why the pipeline clusters before it
//! projects.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carto::cluster::{MedoidClusterer, MedoidInit};
//! use carto::distance::{DistanceMatrix, Euclidean};
//!
//! let dmat = DistanceMatrix::from_features(features.view(), &Euclidean);
//! let clustering = MedoidClusterer::new(8)
//!     .with_init(MedoidInit::Striped)
//!     .cluster(&dmat)?;
//! // clustering.medoids are the control points for projection.
//! ```

mod medoid;

pub use medoid::{cluster_labels, Cluster, MedoidClusterer, MedoidClustering, MedoidInit};
