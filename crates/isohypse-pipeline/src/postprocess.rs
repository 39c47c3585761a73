//! Polyline post-processing: extent filter, knot removal, smoothing.
//!
//! Every completed polyline passes through the three steps in order. A
//! polyline rejected by the filter is dropped before the other two run.
//! Knot removal and smoothing both shorten a polyline, so the filter is
//! applied again to the result.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::filter::{passes_extent_filter, spread};
use crate::knot::remove_knots;
use crate::smooth::smooth;
use crate::types::{ContourConfig, Polyline};

/// Counts accumulated while post-processing one or more polylines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessStats {
    /// Polylines that passed the extent filter.
    pub accepted: usize,
    /// Polylines discarded by the extent filter, before or after
    /// knot removal and smoothing.
    pub rejected: usize,
    /// Knot loops collapsed across all accepted polylines.
    pub knots_removed: usize,
    /// Points across every input polyline.
    pub points_before: usize,
    /// Points across every accepted, smoothed polyline.
    pub points_after: usize,
}

impl AddAssign for PostProcessStats {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.knots_removed += other.knots_removed;
        self.points_before += other.points_before;
        self.points_after += other.points_after;
    }
}

/// Filter, de-knot and smooth one polyline.
///
/// Returns `None` if the polyline fails the extent filter, either as
/// stitched or once knots are collapsed and corners smoothed.
#[must_use = "returns the processed polyline, or None if it was rejected"]
pub fn post_process(
    polyline: Polyline,
    config: &ContourConfig,
    stats: &mut PostProcessStats,
) -> Option<Polyline> {
    let mut points = polyline.into_points();
    stats.points_before += points.len();

    if !passes_extent_filter(&points, config.min_accepted_extent) {
        tracing::trace!(
            points = points.len(),
            spread = spread(&points),
            min_accepted_extent = config.min_accepted_extent,
            "rejecting polyline"
        );
        stats.rejected += 1;
        return None;
    }

    let knots = remove_knots(&mut points, config.knot_settle_index);
    smooth(&mut points, config.smoothing_passes);

    if !passes_extent_filter(&points, config.min_accepted_extent) {
        tracing::trace!(
            points = points.len(),
            knots,
            spread = spread(&points),
            min_accepted_extent = config.min_accepted_extent,
            "rejecting polyline after knot removal and smoothing"
        );
        stats.rejected += 1;
        return None;
    }

    stats.knots_removed += knots;
    stats.accepted += 1;
    stats.points_after += points.len();
    Some(Polyline::new(points))
}

/// Post-process every polyline of one level, keeping stitch order.
#[must_use]
pub fn post_process_all(
    polylines: Vec<Polyline>,
    config: &ContourConfig,
) -> (Vec<Polyline>, PostProcessStats) {
    let mut stats = PostProcessStats::default();
    let kept = polylines
        .into_iter()
        .filter_map(|pl| post_process(pl, config, &mut stats))
        .collect();
    (kept, stats)
}
