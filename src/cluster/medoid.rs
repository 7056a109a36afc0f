//! K-medoid (PAM-style) clustering over a precomputed distance matrix.
//!
//! Partitions N items into k clusters whose representatives are **medoids**:
//! real members minimizing mean distance to the rest of their cluster, unlike
//! the synthetic centroids of k-means. Working from the distance matrix alone
//! makes the algorithm metric-agnostic — it never touches feature vectors
//! except for labeling — which is what lets the surrounding pipeline plug in
//! arbitrary text-distance measures.
//!
//! # Algorithm
//!
//! 1. Initialize k medoids (striped over the index range, or random)
//! 2. **Assign**: each item joins the cluster of its nearest medoid
//! 3. **Update**: each cluster's medoid becomes the member with the lowest
//!    mean distance to its co-members
//! 4. Repeat until no medoid moves, the iteration limit is reached, or the
//!    hard cap of N passes fires
//!
//! A pass that produces an empty cluster reseeds that cluster's medoid with
//! an unused item index and triggers another pass; the clusterer never
//! returns an empty cluster.

use std::cmp::Ordering;

use ndarray::ArrayView2;
use rand::prelude::*;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};

/// Medoid initialization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedoidInit {
    /// Deterministic striped placement: `medoid[i] = i * (n / k)`.
    Striped,
    /// k distinct indices drawn uniformly with a fixed seed.
    Random {
        /// RNG seed, for reproducibility.
        seed: u64,
    },
}

/// One cluster of the final partition.
///
/// `coordinates` in the final output are attached per item by the engine,
/// not stored here; a cluster only knows its membership and label terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster id, `0..k`.
    pub id: usize,
    /// Member item indices, ascending.
    pub members: Vec<usize>,
    /// Medoid item index; always one of `members`.
    pub medoid: usize,
    /// Top-weighted feature dimensions of the summed member vectors.
    /// Empty until labels are computed from a feature matrix.
    pub labels: Vec<usize>,
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct MedoidClustering {
    /// The k medoid item indices, one per cluster.
    pub medoids: Vec<usize>,
    /// The k clusters, each non-empty.
    pub clusters: Vec<Cluster>,
}

/// PAM-style k-medoid clusterer.
///
/// Stateless between calls: every invocation computes from scratch and
/// returns an explicit [`MedoidClustering`], so one configured instance is
/// safe to reuse or share.
#[derive(Debug, Clone)]
pub struct MedoidClusterer {
    k: usize,
    max_iterations: usize,
    label_count: usize,
    init: MedoidInit,
}

impl MedoidClusterer {
    /// Create a clusterer for `k` clusters with striped initialization.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 15,
            label_count: 3,
            init: MedoidInit::Striped,
        }
    }

    /// Set the iteration limit (the hard cap of N passes still applies).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set how many label dimensions to extract per cluster.
    pub fn with_label_count(mut self, label_count: usize) -> Self {
        self.label_count = label_count;
        self
    }

    /// Set the initialization policy.
    pub fn with_init(mut self, init: MedoidInit) -> Self {
        self.init = init;
        self
    }

    /// Partition the items of `dmat` into k clusters.
    pub fn cluster(&self, dmat: &DistanceMatrix) -> Result<MedoidClustering> {
        let n = dmat.element_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k < 1 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut medoids = self.initial_medoids(n);
        let mut members: Vec<Vec<usize>>;

        // Hard safety cap of n passes on top of the configured limit.
        let cap = self.max_iterations.min(n).max(1);
        let mut pass = 0;

        loop {
            members = self.assign(dmat, &medoids);

            if members.iter().any(Vec::is_empty) {
                pass += 1;
                if pass >= n {
                    force_fill_empty(&mut members, &mut medoids);
                    update_medoids(dmat, &members, &mut medoids);
                    break;
                }
                reseed_empty(&mut members, &mut medoids, n);
                continue;
            }

            let previous = medoids.clone();
            update_medoids(dmat, &members, &mut medoids);
            pass += 1;

            if medoids == previous || pass >= cap {
                break;
            }
        }

        for (c, medoid) in medoids.iter().enumerate() {
            debug_assert!(
                members[c].contains(medoid),
                "medoid of cluster {c} is not one of its members"
            );
        }

        let clusters = members
            .into_iter()
            .enumerate()
            .map(|(id, members)| Cluster {
                id,
                members,
                medoid: medoids[id],
                labels: Vec::new(),
            })
            .collect();

        Ok(MedoidClustering { medoids, clusters })
    }

    /// Partition and label: like [`cluster`](Self::cluster), but also fills
    /// each cluster's `labels` from an `items × features` matrix.
    pub fn cluster_labeled(
        &self,
        dmat: &DistanceMatrix,
        features: ArrayView2<'_, f64>,
    ) -> Result<MedoidClustering> {
        let mut clustering = self.cluster(dmat)?;
        for cluster in &mut clustering.clusters {
            cluster.labels = cluster_labels(features, &cluster.members, self.label_count);
        }
        Ok(clustering)
    }

    fn initial_medoids(&self, n: usize) -> Vec<usize> {
        match self.init {
            MedoidInit::Striped => (0..self.k).map(|i| i * (n / self.k)).collect(),
            MedoidInit::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut picked = rand::seq::index::sample(&mut rng, n, self.k).into_vec();
                picked.sort_unstable();
                picked
            }
        }
    }

    fn assign(&self, dmat: &DistanceMatrix, medoids: &[usize]) -> Vec<Vec<usize>> {
        let n = dmat.element_count();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); medoids.len()];

        for point in 0..n {
            let mut nearest = 0;
            let mut best = dmat.dist(point, medoids[0]);

            for (c, &medoid) in medoids.iter().enumerate().skip(1) {
                let d = dmat.dist(point, medoid);
                if d < best {
                    nearest = c;
                    best = d;
                } else if d == best && members[c].len() < members[nearest].len() {
                    // Bit-exact tie: prefer the currently smaller cluster.
                    nearest = c;
                }
            }

            members[nearest].push(point);
        }

        members
    }
}

/// Move each empty cluster's medoid to the smallest unused item index.
fn reseed_empty(members: &mut [Vec<usize>], medoids: &mut [usize], n: usize) {
    for c in 0..members.len() {
        if !members[c].is_empty() {
            continue;
        }
        if let Some(unused) = (0..n).find(|i| !medoids.contains(i)) {
            medoids[c] = unused;
        }
    }
}

/// Last-resort repair when the pass cap fires with empty clusters left:
/// donate one member from the largest cluster to each empty one.
fn force_fill_empty(members: &mut [Vec<usize>], medoids: &mut [usize]) {
    for c in 0..members.len() {
        if !members[c].is_empty() {
            continue;
        }
        let largest = (0..members.len())
            .max_by_key(|&i| members[i].len())
            .unwrap_or(0);
        if let Some(donated) = members[largest].pop() {
            members[c].push(donated);
            medoids[c] = donated;
        }
    }
}

/// True-medoid update: each cluster's new medoid is the member minimizing
/// mean distance to all members of the same cluster.
fn update_medoids(dmat: &DistanceMatrix, members: &[Vec<usize>], medoids: &mut [usize]) {
    for (c, cluster) in members.iter().enumerate() {
        let mut best = cluster[0];
        let mut best_mean = f64::INFINITY;

        for &candidate in cluster {
            let sum: f64 = cluster.iter().map(|&other| dmat.dist(candidate, other)).sum();
            let mean = sum / cluster.len() as f64;
            if mean < best_mean {
                best_mean = mean;
                best = candidate;
            }
        }

        medoids[c] = best;
    }
}

/// Top-`label_count` feature dimensions of the summed member vectors,
/// heaviest first, ties broken by ascending feature index.
pub fn cluster_labels(
    features: ArrayView2<'_, f64>,
    members: &[usize],
    label_count: usize,
) -> Vec<usize> {
    let d = features.ncols();
    let mut centroid = vec![0.0f64; d];
    for &m in members {
        for (j, weight) in centroid.iter_mut().enumerate() {
            *weight += features[[m, j]];
        }
    }

    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        centroid[b]
            .partial_cmp(&centroid[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order.truncate(label_count.min(d));
    order
}
