//! Connectivity repair for the neighbor graph.
//!
//! A raw kNN graph over non-metric distances is frequently disconnected,
//! and the least-squares layout needs every item reachable from the
//! control points. The repair is a frontier traversal from item 0: while
//! unvisited items remain, drain the frontier; when it stalls, splice one
//! unvisited item to its nearest already-visited item with a mutual edge
//! and resume. Terminates in O(N²) and leaves every item reachable from
//! item 0.

use std::collections::BTreeSet;

use crate::distance::DistanceMatrix;
use crate::projection::knn::{NeighborTable, Pair};

/// Repair `table` until the induced neighbor graph is connected.
///
/// Existing entries are kept; repair edges are appended to both endpoints'
/// lists. Deterministic: ordered sets drive the traversal.
pub fn connect(mut table: NeighborTable, dmat: &DistanceMatrix) -> NeighborTable {
    let n = table.len();
    if n < 2 {
        return table;
    }

    let mut visited: BTreeSet<usize> = BTreeSet::new();
    let mut frontier: BTreeSet<usize> = BTreeSet::new();
    let mut unvisited: BTreeSet<usize> = (1..n).collect();
    frontier.insert(0);

    while !unvisited.is_empty() {
        if let Some(&next) = frontier.iter().next() {
            frontier.remove(&next);
            visited.insert(next);
            unvisited.remove(&next);

            for i in 0..table.neighbors(next).len() {
                let neighbor = table.neighbors(next)[i].index;
                if !visited.contains(&neighbor) {
                    frontier.insert(neighbor);
                }
            }
        } else {
            // Frontier stalled with items left: splice the smallest
            // unvisited item to its nearest visited one.
            let next = *unvisited.iter().next().expect("unvisited is non-empty");
            unvisited.remove(&next);
            frontier.insert(next);

            let mut closest = 0;
            let mut min = f64::INFINITY;
            for &seen in &visited {
                let distance = dmat.dist(seen, next);
                if distance < min {
                    min = distance;
                    closest = seen;
                }
            }

            table.push(
                next,
                Pair {
                    index: closest,
                    distance: min,
                },
            );
            table.push(
                closest,
                Pair {
                    index: next,
                    distance: min,
                },
            );
        }
    }

    table
}
