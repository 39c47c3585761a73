//! Minimum-extent filter.
//!
//! Contours traced through flat or near-threshold regions come out as
//! short, tightly bunched polylines. The filter rejects them by their
//! spread: the mean squared distance of every vertex from the first.

use crate::types::Point;

/// Mean squared distance of every point from the first point.
///
/// The first point contributes zero but still counts towards the mean.
/// Returns 0.0 for an empty slice.
#[must_use]
pub fn spread(points: &[Point]) -> f64 {
    let Some(&origin) = points.first() else {
        return 0.0;
    };
    let sum: f64 = points.iter().map(|&p| p.distance_squared(origin)).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    sum / n
}

/// Whether a polyline is large enough to keep.
///
/// Rejects polylines of three or fewer points outright, then any whose
/// [`spread`] is below `min_accepted_extent`.
#[must_use]
pub fn passes_extent_filter(points: &[Point], min_accepted_extent: f64) -> bool {
    points.len() > 3 && spread(points) >= min_accepted_extent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn spread_of_empty_is_zero() {
        assert!(spread(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn spread_of_unit_square() {
        // (0 + 1 + 2 + 1) / 4
        assert!((spread(&square(1.0)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn spread_scales_with_square_of_size() {
        assert!((spread(&square(10.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn small_square_rejected_scaled_square_accepted() {
        let threshold = 50.0;
        assert!(!passes_extent_filter(&square(1.0), threshold));
        assert!(passes_extent_filter(&square(10.0), threshold));
    }

    #[test]
    fn three_points_always_rejected() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ];
        assert!(!passes_extent_filter(&points, 0.0));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(passes_extent_filter(&square(1.0), 1.0));
    }
}
