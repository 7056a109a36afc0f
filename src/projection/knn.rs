//! Exhaustive k-nearest-neighbor search over a distance matrix.
//!
//! Brute force on purpose: the pipeline caps N to a few hundred search
//! hits, where the O(N²) scan beats any index it could build. Each item
//! keeps a fixed-size sorted insertion buffer, shifted as closer candidates
//! appear (O(N²k) worst-case shifts).

use std::time::Instant;

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::debug;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};

/// Neighbor candidate: item index plus distance. Orders ascending by
/// distance within a neighbor list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// Neighbor item index.
    pub index: usize,
    /// Distance to that neighbor.
    pub distance: f64,
}

/// Per-item ordered neighbor lists.
///
/// Fresh from [`KnnSearch`] every item has exactly k entries; mesh repair
/// may append extra edges, so rows are not uniform length afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTable {
    entries: Vec<Vec<Pair>>,
}

impl NeighborTable {
    /// Table with `n` empty rows.
    pub fn empty(n: usize) -> Self {
        Self {
            entries: vec![Vec::new(); n],
        }
    }

    pub(crate) fn from_rows(entries: Vec<Vec<Pair>>) -> Self {
        Self { entries }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighbor entries of item `i`, closest first.
    pub fn neighbors(&self, i: usize) -> &[Pair] {
        &self.entries[i]
    }

    pub(crate) fn push(&mut self, i: usize, pair: Pair) {
        self.entries[i].push(pair);
    }

    /// Neighbor index lists, dropping distances.
    pub fn indices(&self) -> Vec<Vec<usize>> {
        self.entries
            .iter()
            .map(|row| row.iter().map(|p| p.index).collect())
            .collect()
    }

    /// View the table as an undirected `petgraph` graph, one node per item
    /// and one edge per neighbor entry (deduplicated), weighted by distance.
    pub fn to_graph(&self) -> UnGraph<(), f64> {
        let mut graph = UnGraph::new_undirected();
        let nodes: Vec<NodeIndex> = (0..self.entries.len()).map(|_| graph.add_node(())).collect();
        for (i, row) in self.entries.iter().enumerate() {
            for pair in row {
                graph.update_edge(nodes[i], nodes[pair.index], pair.distance);
            }
        }
        graph
    }
}

/// Exhaustive k-nearest-neighbor search.
#[derive(Debug, Clone, Copy)]
pub struct KnnSearch {
    k: usize,
}

impl KnnSearch {
    /// Search for the `k` nearest neighbors of every item.
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Compute the neighbor table: exactly `k` entries per item, sorted
    /// ascending by distance. An item is never its own neighbor.
    pub fn execute(&self, dmat: &DistanceMatrix) -> Result<NeighborTable> {
        let n = dmat.element_count();
        if self.k < 1 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "at least one neighbor per item is required",
            });
        }
        if self.k > n.saturating_sub(1) {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "more neighbors requested than other elements exist",
            });
        }

        let start = Instant::now();
        let sentinel = Pair {
            index: usize::MAX,
            distance: f64::INFINITY,
        };
        let mut entries = vec![vec![sentinel; self.k]; n];

        for i in 0..n {
            let row = &mut entries[i];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dist = dmat.dist(i, j);
                if dist >= row[self.k - 1].distance {
                    continue;
                }
                // Shift the tail right and insert at the first slot this
                // candidate beats.
                let slot = row.partition_point(|p| p.distance <= dist);
                row[slot..].rotate_right(1);
                row[slot] = Pair {
                    index: j,
                    distance: dist,
                };
            }
        }

        debug!(
            elapsed_s = start.elapsed().as_secs_f32(),
            n, k = self.k, "knn search"
        );
        Ok(NeighborTable::from_rows(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Euclidean;
    use ndarray::Array2;

    fn collinear(n: usize) -> DistanceMatrix {
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        DistanceMatrix::from_features(features.view(), &Euclidean)
    }

    #[test]
    fn test_exact_k_sorted_entries() {
        let dmat = collinear(8);
        let table = KnnSearch::new(3).execute(&dmat).unwrap();

        assert_eq!(table.len(), 8);
        for i in 0..8 {
            let row = table.neighbors(i);
            assert_eq!(row.len(), 3);
            for w in row.windows(2) {
                assert!(w[0].distance <= w[1].distance);
            }
            assert!(row.iter().all(|p| p.index != i));
        }
    }

    #[test]
    fn test_collinear_interior_neighbors() {
        // 10 collinear points: every interior point's 3 nearest are its two
        // immediate neighbors plus the next-closest.
        let dmat = collinear(10);
        let table = KnnSearch::new(3).execute(&dmat).unwrap();

        for i in 2..8 {
            let found: Vec<usize> = table.neighbors(i).iter().map(|p| p.index).collect();

            let mut immediate = vec![found[0], found[1]];
            immediate.sort_unstable();
            assert_eq!(immediate, vec![i - 1, i + 1]);

            assert!(found[2] == i - 2 || found[2] == i + 2);
        }
    }

    #[test]
    fn test_k_too_large() {
        let dmat = collinear(4);
        assert!(matches!(
            KnnSearch::new(4).execute(&dmat),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(KnnSearch::new(3).execute(&dmat).is_ok());
    }

    #[test]
    fn test_k_zero_rejected() {
        let dmat = collinear(4);
        assert!(KnnSearch::new(0).execute(&dmat).is_err());
    }

    #[test]
    fn test_to_graph_counts() {
        let dmat = collinear(5);
        let table = KnnSearch::new(2).execute(&dmat).unwrap();
        let graph = table.to_graph();
        assert_eq!(graph.node_count(), 5);
        assert!(graph.edge_count() > 0);
    }
}
