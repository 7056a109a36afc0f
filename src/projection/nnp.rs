//! Nearest-neighbor projection: incremental 2D placement from pairwise
//! distances alone.
//!
//! Seeds item 0 at the origin and item 1 at `(0, d(0,1))`, then places each
//! remaining item at an intersection of two circles centered on its two
//! nearest already-placed items, radii equal to the respective raw
//! distances. With text distances the triangle inequality routinely fails,
//! so the two circles may be separated or nested; those cases fall back to
//! a deterministic displacement along the line through the centers instead
//! of failing. Near-coincident centers are nudged by an epsilon before
//! intersecting so the system never turns singular.
//!
//! Deterministic, O(N²), and intended only for control-point-sized inputs —
//! the full result set is laid out by the least-squares solver, not here.

use crate::distance::DistanceMatrix;

const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy)]
struct Circle {
    cx: f64,
    cy: f64,
    r: f64,
}

enum Intersection {
    /// Degenerate case resolved to a single fallback placement.
    Single([f64; 2]),
    /// Proper intersection at two candidate points.
    Two([f64; 2], [f64; 2]),
}

/// Place all items, item 0 at the origin and the 0–1 distance reproduced
/// exactly. Coordinates are in raw distance units; see [`project`] for the
/// normalized variant.
pub fn place(dmat: &DistanceMatrix) -> Vec<[f64; 2]> {
    let n = dmat.element_count();
    let mut coords = vec![[0.0, 0.0]; n];
    if n < 2 {
        return coords;
    }

    coords[1] = [0.0, dmat.dist(0, 1)];

    for x in 2..n {
        let (q, r) = two_nearest_placed(dmat, x);

        let mut c1 = Circle {
            cx: coords[q][0],
            cy: coords[q][1],
            r: dmat.dist(q, x),
        };
        let c2 = Circle {
            cx: coords[r][0],
            cy: coords[r][1],
            r: dmat.dist(r, x),
        };

        // Nudge near-coincident centers off each axis.
        if (c1.cx - c2.cx).abs() < EPSILON {
            c1.cx += EPSILON;
        }
        if (c1.cy - c2.cy).abs() < EPSILON {
            c1.cy += EPSILON;
        }

        coords[x] = match intersect(c1, c2) {
            Intersection::Single(p) => p,
            Intersection::Two(p1, p2) => {
                // Pick whichever candidate better reproduces both radii.
                // The two candidates are mirror images across the q–r line,
                // so symmetric layouts tie here; resolve a near-tie by how
                // well each candidate reproduces the distances to every
                // placed item, which rejects the fold onto an existing
                // point.
                let e1 = relative_error(coords[q], p1, c1.r) + relative_error(coords[r], p1, c2.r);
                let e2 = relative_error(coords[q], p2, c1.r) + relative_error(coords[r], p2, c2.r);
                if (e1 - e2).abs() < EPSILON {
                    let t1 = placement_error(dmat, &coords, x, p1);
                    let t2 = placement_error(dmat, &coords, x, p2);
                    if t1 <= t2 {
                        p1
                    } else {
                        p2
                    }
                } else if e1 < e2 {
                    p1
                } else {
                    p2
                }
            }
        };
    }

    coords
}

/// Place all items and normalize: x shifted into `[0, 1]`, y shifted to
/// start at 0 and scaled by the same horizontal factor so relative
/// distances survive (uniform scale, no per-axis distortion).
pub fn project(dmat: &DistanceMatrix) -> Vec<[f64; 2]> {
    let mut coords = place(dmat);
    normalize(&mut coords);
    coords
}

/// Uniform-scale normalization anchored to the horizontal extent.
pub fn normalize(coords: &mut [[f64; 2]]) {
    if coords.is_empty() {
        return;
    }

    let mut min_x = coords[0][0];
    let mut max_x = coords[0][0];
    let mut min_y = coords[0][1];
    let mut max_y = coords[0][1];
    for p in coords.iter() {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    // Fall back to the vertical extent when the layout is a vertical line.
    let span_x = max_x - min_x;
    let span_y = max_y - min_y;
    let scale = if span_x > 0.0 { span_x } else { span_y };
    if scale <= 0.0 {
        for p in coords.iter_mut() {
            *p = [0.0, 0.0];
        }
        return;
    }

    for p in coords.iter_mut() {
        p[0] = (p[0] - min_x) / scale;
        p[1] = (p[1] - min_y) / scale;
    }
}

/// The two nearest already-placed items `(q, r)` of item `x`, `q` closest.
fn two_nearest_placed(dmat: &DistanceMatrix, x: usize) -> (usize, usize) {
    let mut q = 0;
    let mut r = 1;
    let mut min1 = f64::INFINITY;
    let mut min2 = f64::INFINITY;

    for placed in 0..x {
        let distance = dmat.dist(x, placed);
        if distance < min1 {
            r = q;
            min2 = min1;
            q = placed;
            min1 = distance;
        } else if distance < min2 {
            r = placed;
            min2 = distance;
        }
    }

    (q, r)
}

fn relative_error(anchor: [f64; 2], candidate: [f64; 2], radius: f64) -> f64 {
    let produced = ((anchor[0] - candidate[0]).powi(2) + (anchor[1] - candidate[1]).powi(2))
        .sqrt()
        .max(EPSILON);
    (radius / produced - 1.0).abs()
}

/// Combined relative error of `candidate` against every already-placed item.
fn placement_error(dmat: &DistanceMatrix, coords: &[[f64; 2]], x: usize, candidate: [f64; 2]) -> f64 {
    (0..x)
        .map(|placed| relative_error(coords[placed], candidate, dmat.dist(placed, x)))
        .sum()
}

fn intersect(c1: Circle, c2: Circle) -> Intersection {
    let dx = c2.cx - c1.cx;
    let dy = c2.cy - c1.cy;
    let dist = (dx * dx + dy * dy).sqrt();

    if dist > c1.r + c2.r {
        // Separated circles (triangle-inequality violation): place on the
        // line through the centers, half the gap past the base radius.
        let gap = dist - (c1.r + c2.r);
        let (base, other) = if c1.cx < c2.cx { (c1, c2) } else { (c2, c1) };
        let m = (other.cy - base.cy) / (other.cx - base.cx);
        let reach = base.r + gap / 2.0;
        let z = (reach * reach / (1.0 + m * m)).sqrt();
        return Intersection::Single([base.cx + z, base.cy + m * z]);
    }

    if dist < (c1.r - c2.r).abs() {
        // One circle nested in the other: step out from the larger circle's
        // center toward the smaller one, landing between the two arcs.
        let (base, other) = if c1.r > c2.r { (c1, c2) } else { (c2, c1) };
        let reach = other.r + dist + (base.r - other.r - dist) / 2.0;
        let m = (other.cy - base.cy) / (other.cx - base.cx);
        let z = (reach * reach / (1.0 + m * m)).sqrt();
        let sx = if other.cx >= base.cx { 1.0 } else { -1.0 };
        let sy = if other.cy >= base.cy { 1.0 } else { -1.0 };
        return Intersection::Single([base.cx + sx * z, base.cy + sy * m.abs() * z]);
    }

    // Proper intersection: radical-line construction. h² can dip slightly
    // negative at tangency from rounding; clamp it.
    let a = (c1.r * c1.r - c2.r * c2.r + dist * dist) / (2.0 * dist);
    let h = (c1.r * c1.r - a * a).max(0.0).sqrt();
    let mx = c1.cx + a * dx / dist;
    let my = c1.cy + a * dy / dist;

    Intersection::Two(
        [mx + h * dy / dist, my - h * dx / dist],
        [mx - h * dy / dist, my + h * dx / dist],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceMatrix, Euclidean};
    use ndarray::array;

    fn unit_square() -> DistanceMatrix {
        let corners = array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        DistanceMatrix::from_features(corners.view(), &Euclidean)
    }

    #[test]
    fn test_seed_distance_exact() {
        let dmat = unit_square();
        let coords = place(&dmat);

        assert_eq!(coords[0], [0.0, 0.0]);
        let d01 = ((coords[0][0] - coords[1][0]).powi(2) + (coords[0][1] - coords[1][1]).powi(2))
            .sqrt();
        assert!((d01 - dmat.get(0, 1).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_unit_square_distances_recovered() {
        // Euclidean input is embeddable exactly; every pairwise distance
        // should be reconstructed within 5%.
        let dmat = unit_square();
        let coords = place(&dmat);

        for i in 0..4 {
            for j in (i + 1)..4 {
                let produced = ((coords[i][0] - coords[j][0]).powi(2)
                    + (coords[i][1] - coords[j][1]).powi(2))
                .sqrt();
                let expected = dmat.get(i, j).unwrap();
                assert!(
                    (produced - expected).abs() / expected < 0.05,
                    "pair ({i}, {j}): produced {produced}, expected {expected}"
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let dmat = unit_square();
        assert_eq!(place(&dmat), place(&dmat));
        assert_eq!(project(&dmat), project(&dmat));
    }

    #[test]
    fn test_triangle_violation_still_places() {
        // d(0,1) wildly exceeds d(0,2) + d(1,2): the two circles around the
        // placed seeds are separated, forcing the displacement fallback.
        let mut dmat = DistanceMatrix::new(3);
        dmat.set_distance(0, 1, 10.0).unwrap();
        dmat.set_distance(0, 2, 1.0).unwrap();
        dmat.set_distance(1, 2, 1.0).unwrap();

        let coords = place(&dmat);
        for p in &coords {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn test_nested_circles_still_place() {
        let mut dmat = DistanceMatrix::new(3);
        dmat.set_distance(0, 1, 1.0).unwrap();
        dmat.set_distance(0, 2, 0.1).unwrap();
        dmat.set_distance(1, 2, 10.0).unwrap();

        let coords = place(&dmat);
        for p in &coords {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn test_tiny_inputs() {
        assert!(place(&DistanceMatrix::new(0)).is_empty());
        assert_eq!(place(&DistanceMatrix::new(1)), vec![[0.0, 0.0]]);

        let mut dmat = DistanceMatrix::new(2);
        dmat.set_distance(0, 1, 3.0).unwrap();
        assert_eq!(place(&dmat), vec![[0.0, 0.0], [0.0, 3.0]]);
    }

    #[test]
    fn test_normalize_spans_unit_x() {
        let mut coords = vec![[2.0, 4.0], [6.0, 4.0], [4.0, 6.0]];
        normalize(&mut coords);

        let xs: Vec<f64> = coords.iter().map(|p| p[0]).collect();
        assert_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 0.0);
        assert_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1.0);
        // Uniform scale: the y spread shrinks by the same factor (4.0).
        assert!((coords[2][1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_degenerate_layouts() {
        let mut same = vec![[3.0, 3.0], [3.0, 3.0]];
        normalize(&mut same);
        assert_eq!(same, vec![[0.0, 0.0], [0.0, 0.0]]);

        // Vertical line: scale falls back to the y extent.
        let mut line = vec![[1.0, 0.0], [1.0, 2.0]];
        normalize(&mut line);
        assert_eq!(line, vec![[0.0, 0.0], [0.0, 1.0]]);
    }
}
