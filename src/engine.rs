//! End-to-end pipeline: feature matrix in, clustered 2D layout out.
//!
//! This is the seam the surrounding search system calls: it owns the
//! ordering of stages (distance matrix → medoid clustering → control-point
//! projection → layout) and nothing else. All knobs live in an explicit
//! [`EngineConfig`]; there is no global or shared state, so concurrent
//! requests simply call [`layout`] independently.
//!
//! Cost is polynomial in N (O(N²) matrix build and kNN, O(N²k + k³) for
//! the solve), with no internal cancellation. Cap N to the top few hundred
//! hits, and enforce deadlines outside this crate.

use std::time::Instant;

use ndarray::ArrayView2;
use tracing::info;

use crate::cluster::{Cluster, MedoidClusterer, MedoidInit};
use crate::distance::{DistanceMatrix, DistanceMeasure};
use crate::error::{Error, Result};
use crate::projection::ProjectionSolver;

/// Pipeline configuration. Explicit parameters only; defaults match the
/// interactive-exploration use case.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of clusters (and thus control points).
    pub num_clusters: usize,
    /// Iteration limit for medoid clustering.
    pub max_iterations: usize,
    /// Label dimensions to extract per cluster.
    pub label_count: usize,
    /// Neighbors per item in the layout mesh; clamped to N-1.
    pub num_neighbors: usize,
    /// Force-step damping divisor.
    pub fraction_delta: f64,
    /// Force-relaxation sweeps over the control layout.
    pub force_iterations: usize,
    /// Medoid initialization policy.
    pub init: MedoidInit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_clusters: 10,
            max_iterations: 15,
            label_count: 3,
            num_neighbors: 2,
            fraction_delta: 0.8,
            force_iterations: 50,
            init: MedoidInit::Striped,
        }
    }
}

/// Final layout, index-aligned to the input items. Owned by the caller;
/// nothing is retained between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// The k clusters, largest first, each labeled and non-empty.
    pub clusters: Vec<Cluster>,
    /// 2D coordinate per item.
    pub coordinates: Vec<[f64; 2]>,
    /// Neighbor index list per item (mesh edges, repair edges included).
    pub neighbors: Vec<Vec<usize>>,
}

/// Map a cluster's label dimensions to vocabulary terms.
///
/// The feature columns of the input matrix usually correspond to a term
/// vocabulary; this resolves the numeric labels of [`cluster_labels`]
/// against it. Out-of-range dimensions are skipped.
///
/// [`cluster_labels`]: crate::cluster::cluster_labels
pub fn label_terms<'a>(cluster: &Cluster, vocabulary: &'a [String]) -> Vec<&'a str> {
    cluster
        .labels
        .iter()
        .filter_map(|&dim| vocabulary.get(dim))
        .map(String::as_str)
        .collect()
}

/// Run the full pipeline over an `items × features` matrix.
pub fn layout(
    features: ArrayView2<'_, f64>,
    measure: &dyn DistanceMeasure,
    config: &EngineConfig,
) -> Result<Layout> {
    let n = features.nrows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }

    let start = Instant::now();
    let dmat = DistanceMatrix::from_features(features, measure);

    let clustering = MedoidClusterer::new(config.num_clusters)
        .with_max_iterations(config.max_iterations)
        .with_label_count(config.label_count)
        .with_init(config.init)
        .cluster_labeled(&dmat, features)?;

    if n == 1 {
        return Ok(Layout {
            clusters: clustering.clusters,
            coordinates: vec![[0.0, 0.0]],
            neighbors: vec![Vec::new()],
        });
    }

    let num_neighbors = config.num_neighbors.clamp(1, n - 1);
    let (coordinates, table) = ProjectionSolver::new()
        .with_force_iterations(config.force_iterations)
        .with_num_neighbors(num_neighbors)
        .with_fraction_delta(config.fraction_delta)
        .project(&dmat, &clustering.medoids)?;

    let mut clusters = clustering.clusters;
    clusters.sort_by(|a, b| b.members.len().cmp(&a.members.len()).then(a.id.cmp(&b.id)));

    info!(
        elapsed_s = start.elapsed().as_secs_f32(),
        n,
        k = clusters.len(),
        "layout pipeline finished"
    );

    Ok(Layout {
        clusters,
        coordinates,
        neighbors: table.indices(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{Cosine, Euclidean};
    use ndarray::{array, Array2};

    fn three_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.3, 0.1],
            [0.1, 0.4],
            [0.2, 0.2],
            [8.0, 8.0],
            [8.3, 8.1],
            [8.1, 8.4],
            [8.2, 8.2],
            [0.0, 9.0],
            [0.3, 9.1],
            [0.1, 9.4],
            [0.2, 9.2],
        ]
    }

    #[test]
    fn test_end_to_end_shapes() {
        let features = three_blobs();
        let config = EngineConfig {
            num_clusters: 3,
            num_neighbors: 3,
            ..Default::default()
        };

        let result = layout(features.view(), &Euclidean, &config).unwrap();

        assert_eq!(result.clusters.len(), 3);
        assert_eq!(result.coordinates.len(), 12);
        assert_eq!(result.neighbors.len(), 12);

        let mut seen: Vec<usize> = result
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());

        for p in &result.coordinates {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
        for (i, nbrs) in result.neighbors.iter().enumerate() {
            assert!(nbrs.len() >= 3);
            assert!(nbrs.iter().all(|&j| j != i && j < 12));
        }
    }

    #[test]
    fn test_clusters_sorted_by_size() {
        let features = three_blobs();
        let config = EngineConfig {
            num_clusters: 4,
            num_neighbors: 3,
            ..Default::default()
        };

        let result = layout(features.view(), &Euclidean, &config).unwrap();
        for w in result.clusters.windows(2) {
            assert!(w[0].members.len() >= w[1].members.len());
        }
    }

    #[test]
    fn test_labels_present() {
        let features = three_blobs();
        let config = EngineConfig {
            num_clusters: 3,
            num_neighbors: 3,
            label_count: 2,
            ..Default::default()
        };

        let result = layout(features.view(), &Euclidean, &config).unwrap();
        for cluster in &result.clusters {
            assert_eq!(cluster.labels.len(), 2);
        }
    }

    #[test]
    fn test_cosine_measure_works_end_to_end() {
        let features = array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.8, 0.2, 0.1],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.8, 0.2],
        ];
        let config = EngineConfig {
            num_clusters: 2,
            num_neighbors: 2,
            ..Default::default()
        };

        let result = layout(features.view(), &Cosine, &config).unwrap();
        assert_eq!(result.coordinates.len(), 6);
    }

    #[test]
    fn test_single_item() {
        let features = array![[1.0, 2.0]];
        let config = EngineConfig {
            num_clusters: 1,
            ..Default::default()
        };

        let result = layout(features.view(), &Euclidean, &config).unwrap();
        assert_eq!(result.coordinates, vec![[0.0, 0.0]]);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.neighbors, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_empty_input() {
        let features = Array2::<f64>::zeros((0, 3));
        let result = layout(features.view(), &Euclidean, &EngineConfig::default());
        assert_eq!(result, Err(Error::EmptyInput));
    }

    #[test]
    fn test_label_terms_resolves_vocabulary() {
        let cluster = Cluster {
            id: 0,
            members: vec![0, 1],
            medoid: 0,
            labels: vec![2, 0, 9],
        };
        let vocabulary: Vec<String> =
            ["neural", "graph", "embedding"].iter().map(|s| s.to_string()).collect();

        // Dimension 9 has no vocabulary entry and is dropped.
        assert_eq!(label_terms(&cluster, &vocabulary), vec!["embedding", "neural"]);
    }

    #[test]
    fn test_too_many_clusters() {
        let features = array![[0.0, 0.0], [1.0, 1.0]];
        let config = EngineConfig {
            num_clusters: 5,
            ..Default::default()
        };
        assert!(matches!(
            layout(features.view(), &Euclidean, &config),
            Err(Error::InvalidClusterCount { .. })
        ));
    }
}
