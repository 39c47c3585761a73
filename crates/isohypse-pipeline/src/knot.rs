//! Knot removal.
//!
//! Stitching can route a polyline back through a vertex it already
//! visited, leaving a small self-intersecting loop. Each such loop is
//! collapsed to its repeated vertex.

use crate::types::Point;

/// Collapse every loop that starts and ends on the same vertex position.
///
/// Scans pairs `(i, j)` with `settle <= i < j`. On the first exact
/// positional duplicate, vertices `i + 1..=j` are removed and the scan
/// restarts. Every collapse strictly shortens the list, so this
/// terminates.
///
/// Vertices before `settle` are never the start of a knot. A settle
/// index of 1 keeps the closing vertex of a closed contour (which equals
/// vertex 0).
///
/// A duplicate on the last vertex closes a ring and is not a knot. A
/// contour whose head grew before it closed ends on vertex 1 or later,
/// and collapsing that pair would delete the whole ring.
///
/// Returns the number of loops collapsed.
pub fn remove_knots(points: &mut Vec<Point>, settle: usize) -> usize {
    let mut collapsed = 0;
    while let Some((i, j)) = find_knot(points, settle) {
        tracing::trace!(start = i, end = j, removed = j - i, "collapsing knot");
        points.drain(i + 1..=j);
        collapsed += 1;
    }
    collapsed
}

/// The first `(i, j)` with `settle <= i < j < len - 1` and
/// `points[i] == points[j]`.
fn find_knot(points: &[Point], settle: usize) -> Option<(usize, usize)> {
    let last = points.len().checked_sub(1)?;
    (settle..last).find_map(|i| {
        points[i + 1..last]
            .iter()
            .position(|&q| q == points[i])
            .map(|offset| (i, i + 1 + offset))
    })
}
