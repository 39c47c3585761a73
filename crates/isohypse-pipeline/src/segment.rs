//! Segment extraction: turn one classified grid cell into crossing
//! segments by linear interpolation along the crossed edges.
//!
//! Each edge is always interpolated in the same direction (top-left end
//! first), so two cells sharing an edge compute bit-identical crossing
//! points. Stitching relies on this to join neighbouring segments at
//! zero distance.

use crate::classify::{CaseId, classify};
use crate::height_field::HeightField;
use crate::types::{Point, Segment};

/// A grid cell: corner positions at a fixed step plus sampled values.
///
/// Corners are `a` (top-left), `b` (top-right), `c` (bottom-right) and
/// `d` (bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Top-left corner position.
    pub origin: Point,
    /// Side length in samples.
    pub step: f64,
    /// Value at the top-left corner.
    pub a: f64,
    /// Value at the top-right corner.
    pub b: f64,
    /// Value at the bottom-right corner.
    pub c: f64,
    /// Value at the bottom-left corner.
    pub d: f64,
}

impl GridCell {
    /// Sample the cell whose top-left corner is `(x, y)`.
    ///
    /// The caller guarantees `x + step < width` and `y + step < height`.
    pub fn sample<F: HeightField + ?Sized>(field: &F, x: u32, y: u32, step: u32) -> Self {
        Self {
            origin: Point::new(f64::from(x), f64::from(y)),
            step: f64::from(step),
            a: field.sample(x, y),
            b: field.sample(x + step, y),
            c: field.sample(x + step, y + step),
            d: field.sample(x, y + step),
        }
    }

    /// Top-left corner position.
    #[must_use]
    pub const fn pos_a(&self) -> Point {
        self.origin
    }

    /// Top-right corner position.
    #[must_use]
    pub fn pos_b(&self) -> Point {
        Point::new(self.origin.x + self.step, self.origin.y)
    }

    /// Bottom-right corner position.
    #[must_use]
    pub fn pos_c(&self) -> Point {
        Point::new(self.origin.x + self.step, self.origin.y + self.step)
    }

    /// Bottom-left corner position.
    #[must_use]
    pub fn pos_d(&self) -> Point {
        Point::new(self.origin.x, self.origin.y + self.step)
    }

    /// Saddle discriminant `a*c - b*d`, each product rounded before the
    /// subtraction.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn resolver(&self) -> f64 {
        self.a * self.c - self.b * self.d
    }

    /// Marching-squares case of this cell at `iso`.
    #[must_use]
    pub fn case(&self, iso: f64) -> CaseId {
        classify(self.a, self.b, self.c, self.d, iso)
    }

    /// Crossing point on `edge`, or `None` when both ends of the edge
    /// hold the same value (no defined crossing).
    #[must_use]
    pub fn crossing(&self, edge: Edge, iso: f64) -> Option<Point> {
        let (p0, v0, p1, v1) = match edge {
            Edge::Top => (self.pos_a(), self.a, self.pos_b(), self.b),
            Edge::Right => (self.pos_b(), self.b, self.pos_c(), self.c),
            Edge::Bottom => (self.pos_d(), self.d, self.pos_c(), self.c),
            Edge::Left => (self.pos_a(), self.a, self.pos_d(), self.d),
        };
        interpolate(p0, v0, p1, v1, iso)
    }
}

/// A cell edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// `a` to `b`.
    Top,
    /// `b` to `c`.
    Right,
    /// `d` to `c`.
    Bottom,
    /// `a` to `d`.
    Left,
}

/// Linear interpolation of the iso crossing between two samples:
/// `p0 + (p1 - p0) * (iso - v0) / (v1 - v0)`.
///
/// Equal values give a zero denominator; that edge is reported as having
/// no crossing.
#[must_use]
pub fn interpolate(p0: Point, v0: f64, p1: Point, v1: f64, iso: f64) -> Option<Point> {
    let denominator = v1 - v0;
    if denominator == 0.0 {
        return None;
    }
    Some(p0.lerp(p1, (iso - v0) / denominator))
}

/// Edge pairs connected by the segments of a case, in emission order.
///
/// Saddle cases consult `resolver` to pick between the two diagonal
/// pairings.
#[must_use]
pub fn edge_pairs(case: CaseId, resolver: f64) -> &'static [(Edge, Edge)] {
    use Edge::{Bottom, Left, Right, Top};

    match case.bits() {
        1 | 14 => &[(Left, Bottom)],
        2 | 13 => &[(Right, Bottom)],
        3 | 12 => &[(Left, Right)],
        4 | 11 => &[(Right, Top)],
        6 | 9 => &[(Top, Bottom)],
        7 | 8 => &[(Left, Top)],
        5 if resolver > 0.0 => &[(Left, Top), (Right, Bottom)],
        5 => &[(Right, Top), (Left, Bottom)],
        10 if resolver > 0.0 => &[(Right, Top), (Left, Bottom)],
        10 => &[(Left, Top), (Right, Bottom)],
        _ => &[],
    }
}

/// Append the segments of `cell` at `iso` to `out`.
///
/// Degenerate segments (both endpoints exactly equal) and segments with
/// an undefined crossing are skipped. Returns the number of skipped
/// segments.
pub fn extract_into(cell: &GridCell, iso: f64, out: &mut Vec<Segment>) -> usize {
    let case = cell.case(iso);
    if !case.is_crossed() {
        return 0;
    }

    let mut skipped = 0;
    for &(from, to) in edge_pairs(case, cell.resolver()) {
        let segment = cell
            .crossing(from, iso)
            .zip(cell.crossing(to, iso))
            .map(|(start, end)| Segment::new(start, end, iso));
        match segment {
            Some(s) if !s.is_degenerate() => out.push(s),
            _ => skipped += 1,
        }
    }
    skipped
}

/// The segments of `cell` at `iso` (zero, one or two).
#[must_use]
pub fn extract(cell: &GridCell, iso: f64) -> Vec<Segment> {
    let mut out = Vec::with_capacity(2);
    extract_into(cell, iso, &mut out);
    out
}

/// All segments of one iso-level, plus sweep counters.
#[derive(Debug, Clone, Default)]
pub struct LevelSegments {
    /// Extracted segments in row-major cell order.
    pub segments: Vec<Segment>,
    /// Number of cells visited.
    pub cell_count: usize,
    /// Segments dropped as degenerate or undefined.
    pub skipped: usize,
}

/// Sweep every cell of `field` at `step` granularity and collect the
/// segments for `iso`.
///
/// Cells whose right or bottom corners would fall outside the field are
/// not visited.
pub fn sweep<F: HeightField + ?Sized>(field: &F, iso: f64, step: u32) -> LevelSegments {
    let mut level = LevelSegments::default();
    if step == 0 {
        return level;
    }
    let stride = step as usize;
    for y in (0..field.height().saturating_sub(step)).step_by(stride) {
        for x in (0..field.width().saturating_sub(step)).step_by(stride) {
            let cell = GridCell::sample(field, x, y, step);
            level.skipped += extract_into(&cell, iso, &mut level.segments);
            level.cell_count += 1;
        }
    }
    level
}
