//! Stitching: grow ordered polylines out of the unordered segments of
//! one iso-level.
//!
//! A polyline is seeded from the first remaining segment and grown at
//! its tail, then at its head, by any remaining segment with an endpoint
//! strictly within the search radius. When neither end can grow the
//! polyline is complete and the next one is seeded.
//!
//! # Strategy pattern
//!
//! When several segments are within reach, [`StitchPolicy`] decides
//! which one wins. [`FirstMatch`](StitchPolicy::FirstMatch) takes the
//! first in segment order and is cheap, but on dense or noisy fields it
//! can bridge into a neighbouring branch.
//! [`NearestMatch`](StitchPolicy::NearestMatch) takes the closest
//! candidate using an R\*-tree of segment endpoints.

use std::collections::VecDeque;
use std::fmt;

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::types::{Point, Polyline, Segment};

/// Selects how a polyline end picks among matching segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StitchPolicy {
    /// The first remaining segment (in extraction order) with an
    /// endpoint within the radius wins. Start endpoints are checked
    /// before end endpoints.
    #[default]
    FirstMatch,

    /// The segment endpoint closest to the polyline end wins. Ties go to
    /// the lower segment index.
    NearestMatch,
}

impl fmt::Display for StitchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => f.write_str("first-match"),
            Self::NearestMatch => f.write_str("nearest-match"),
        }
    }
}

/// Trait for stitching strategies.
///
/// Input: the unordered segments of one iso-level.
/// Output: ordered polylines covering every segment exactly once.
pub trait Stitcher {
    /// Stitch `segments` into polylines, joining endpoints closer than
    /// `search_radius`.
    fn stitch(&self, segments: &[Segment], search_radius: f64) -> Vec<Polyline>;
}

impl Stitcher for StitchPolicy {
    fn stitch(&self, segments: &[Segment], search_radius: f64) -> Vec<Polyline> {
        match *self {
            Self::FirstMatch => stitch_first_match(segments, search_radius),
            Self::NearestMatch => stitch_nearest_match(segments, search_radius),
        }
    }
}

/// Which end of a segment an index entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SegmentEnd {
    Start,
    End,
}

/// Grows one polyline from `seed`. `find` is given the current end and
/// whether it is the tail (`true`) or head (`false`), consumes a
/// matching segment and returns the point to attach.
fn grow(seed: Segment, mut find: impl FnMut(Point, bool) -> Option<Point>) -> Polyline {
    let mut points = VecDeque::from([seed.start, seed.end]);
    loop {
        if let Some(&tail) = points.back()
            && let Some(next) = find(tail, true)
        {
            points.push_back(next);
            continue;
        }
        if let Some(&head) = points.front()
            && let Some(prev) = find(head, false)
        {
            points.push_front(prev);
            continue;
        }
        break;
    }
    Polyline::new(Vec::from(points))
}

/// First-match stitching over a linear scan of the remaining segments.
fn stitch_first_match(segments: &[Segment], search_radius: f64) -> Vec<Polyline> {
    let radius_sq = search_radius * search_radius;
    let within = |a: Point, b: Point| a.distance_squared(b) < radius_sq;

    let mut remaining: Vec<Segment> = segments.to_vec();
    let mut polylines = Vec::new();

    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let polyline = grow(seed, |end, is_tail| {
            let hit = remaining.iter().enumerate().find_map(|(i, s)| {
                // The tail prefers a segment that starts at it, the head
                // one that ends at it.
                let (near, far) = if is_tail {
                    (s.start, s.end)
                } else {
                    (s.end, s.start)
                };
                if within(near, end) {
                    Some((i, far))
                } else if within(far, end) {
                    Some((i, near))
                } else {
                    None
                }
            });
            hit.map(|(i, point)| {
                remaining.remove(i);
                point
            })
        });
        polylines.push(polyline);
    }

    polylines
}

/// An endpoint in the R\*-tree, tagged with its segment index and end.
type IndexedEndpoint = GeomWithData<[f64; 2], (usize, SegmentEnd)>;

fn endpoint(p: Point, index: usize, end: SegmentEnd) -> IndexedEndpoint {
    GeomWithData::new([p.x, p.y], (index, end))
}

/// Nearest-match stitching backed by an R\*-tree of live endpoints.
fn stitch_nearest_match(segments: &[Segment], search_radius: f64) -> Vec<Polyline> {
    let radius_sq = search_radius * search_radius;
    let mut tree = RTree::bulk_load(
        segments
            .iter()
            .enumerate()
            .flat_map(|(i, s)| {
                [
                    endpoint(s.start, i, SegmentEnd::Start),
                    endpoint(s.end, i, SegmentEnd::End),
                ]
            })
            .collect(),
    );
    let mut alive = vec![true; segments.len()];
    let mut polylines = Vec::new();

    let consume = |tree: &mut RTree<IndexedEndpoint>, alive: &mut [bool], index: usize| {
        alive[index] = false;
        let s = segments[index];
        tree.remove(&endpoint(s.start, index, SegmentEnd::Start));
        tree.remove(&endpoint(s.end, index, SegmentEnd::End));
    };

    for seed_index in 0..segments.len() {
        if !alive[seed_index] {
            continue;
        }
        consume(&mut tree, &mut alive, seed_index);

        let polyline = grow(segments[seed_index], |end, is_tail| {
            let query = [end.x, end.y];
            let preferred = if is_tail {
                SegmentEnd::Start
            } else {
                SegmentEnd::End
            };
            let best = tree
                .locate_within_distance(query, radius_sq)
                .map(|e| {
                    let (index, which) = e.data;
                    let p = Point::new(e.geom()[0], e.geom()[1]);
                    (p.distance_squared(end), index, which != preferred, which)
                })
                .filter(|&(d, ..)| d < radius_sq)
                .min_by(|a, b| {
                    a.0.total_cmp(&b.0)
                        .then(a.1.cmp(&b.1))
                        .then(a.2.cmp(&b.2))
                });
            let (_, index, _, which) = best?;
            consume(&mut tree, &mut alive, index);
            let s = segments[index];
            Some(match which {
                SegmentEnd::Start => s.end,
                SegmentEnd::End => s.start,
            })
        });
        polylines.push(polyline);
    }

    polylines
}
