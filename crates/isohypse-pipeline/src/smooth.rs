//! Bezier corner-cutting smoothing.
//!
//! Each round is one quadratic pass followed by one cubic pass. Both
//! passes sweep left to right and write their result back into the list
//! immediately, so the point just smoothed is the left control point of
//! the next window.
//!
//! The first and last points are never moved.

use crate::types::Point;

const T: f64 = 0.5;

/// Replace every interior point with the quadratic De Casteljau point at
/// `t = 0.5` of itself and its two neighbours. Point count is unchanged.
pub fn quadratic_pass(points: &mut [Point]) {
    let mut i = 0;
    while i + 2 < points.len() {
        let (p0, p1, p2) = (points[i], points[i + 1], points[i + 2]);
        let q0 = p0.lerp(p1, T);
        let q1 = p1.lerp(p2, T);
        points[i + 1] = q0.lerp(q1, T);
        i += 1;
    }
}

/// Replace each pair `p[i+1], p[i+2]` with the cubic De Casteljau point
/// at `t = 0.5` of `p[i..=i+3]`. Every step removes one point.
///
/// Steps run while `i + 4 < len`, so a window never ends on the last
/// point and a polyline of four or more points keeps at least four.
pub fn cubic_pass(points: &mut Vec<Point>) {
    let mut i = 0;
    while i + 4 < points.len() {
        let (p0, p1, p2, p3) = (points[i], points[i + 1], points[i + 2], points[i + 3]);
        let q0 = p0.lerp(p1, T);
        let q1 = p1.lerp(p2, T);
        let q2 = p2.lerp(p3, T);
        let r0 = q0.lerp(q1, T);
        let r1 = q1.lerp(q2, T);
        points.splice(i + 1..=i + 2, [r0.lerp(r1, T)]);
        i += 1;
    }
}

/// Run `passes` rounds of quadratic then cubic smoothing.
pub fn smooth(points: &mut Vec<Point>, passes: u32) {
    for _ in 0..passes {
        quadratic_pass(points);
        cubic_pass(points);
    }
}
