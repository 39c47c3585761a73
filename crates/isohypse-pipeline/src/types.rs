//! Shared types for the isohypse contour pipeline.

use serde::{Deserialize, Serialize};

use crate::stitch::StitchPolicy;

/// Re-export `GrayImage` so downstream crates can hand 8-bit height maps
/// to the pipeline without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in field coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (samples from left edge).
    pub x: f64,
    /// Vertical position (samples from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation towards `other`: `self + (other - self) * t`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            (other.x - self.x).mul_add(t, self.x),
            (other.y - self.y).mul_add(t, self.y),
        )
    }
}

/// A sequence of connected points forming a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// A straight crossing segment produced for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
    /// The iso-value whose crossing this segment traces.
    pub iso_value: f64,
}

impl Segment {
    /// Create a new segment.
    #[must_use]
    pub const fn new(start: Point, end: Point, iso_value: f64) -> Self {
        Self {
            start,
            end,
            iso_value,
        }
    }

    /// Returns `true` if both endpoints are exactly equal.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Height field dimensions in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in samples.
    pub width: u32,
    /// Height in samples.
    pub height: u32,
}

/// Configuration for the contour pipeline.
///
/// Construct with [`Default`] and override fields with struct update
/// syntax. [`validate`](Self::validate) is called by every pipeline
/// entry point before the sweep begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Highest iso-value to trace. Levels are swept downward from here.
    pub max_iso: f64,

    /// Distance between consecutive iso-values. Must be positive.
    pub iso_interval: f64,

    /// Grid cell size in samples. Must be at least 1.
    pub step_size: u32,

    /// Endpoint matching radius for stitching. `None` uses half the
    /// step size.
    pub search_radius: Option<f64>,

    /// Minimum mean squared distance of a polyline's points from its
    /// first point. Smaller polylines are discarded as noise.
    pub min_accepted_extent: f64,

    /// Which candidate wins when several segments could extend a
    /// polyline.
    pub stitch_policy: StitchPolicy,

    /// First vertex index considered by knot removal.
    ///
    /// With the default of 1 the closing vertex of a closed contour,
    /// which equals vertex 0, is never treated as a knot.
    pub knot_settle_index: usize,

    /// Number of quadratic+cubic smoothing rounds. 0 disables smoothing.
    pub smoothing_passes: u32,
}

impl ContourConfig {
    /// Default highest iso-value.
    pub const DEFAULT_MAX_ISO: f64 = 250.0;
    /// Default iso-value interval.
    pub const DEFAULT_ISO_INTERVAL: f64 = 4.0;
    /// Default grid step in samples.
    pub const DEFAULT_STEP_SIZE: u32 = 3;
    /// Default minimum accepted spread.
    pub const DEFAULT_MIN_ACCEPTED_EXTENT: f64 = 200.0;
    /// Default knot settle index.
    pub const DEFAULT_KNOT_SETTLE_INDEX: usize = 1;
    /// Default number of smoothing rounds.
    pub const DEFAULT_SMOOTHING_PASSES: u32 = 1;
    /// Every n-th interval is a major (index) contour.
    pub const MAJOR_EVERY: f64 = 5.0;
    /// Largest number of iso-levels a config may sweep.
    pub const MAX_LEVEL_COUNT: u32 = 100_000;

    /// The stitching radius actually used: the explicit
    /// `search_radius`, or half the step size.
    #[must_use]
    pub fn effective_search_radius(&self) -> f64 {
        self.search_radius
            .unwrap_or_else(|| f64::from(self.step_size) / 2.0)
    }

    /// Iso-values swept by the pipeline, highest first.
    ///
    /// Computed as `max_iso - k * iso_interval` for `k = 0, 1, ...`
    /// while the value stays above zero, so rounding error does not
    /// accumulate across levels. Returns an empty list for an invalid
    /// interval and never more than [`MAX_LEVEL_COUNT`](Self::MAX_LEVEL_COUNT)
    /// levels.
    #[must_use]
    pub fn levels(&self) -> Vec<f64> {
        if !(self.iso_interval > 0.0 && self.iso_interval.is_finite() && self.max_iso.is_finite())
        {
            return Vec::new();
        }
        (0..Self::MAX_LEVEL_COUNT)
            .map(|k| f64::from(k).mul_add(-self.iso_interval, self.max_iso))
            .take_while(|&iso| iso > 0.0)
            .collect()
    }

    /// Whether `iso_value` is a major (index) contour level, i.e. a
    /// multiple of `MAJOR_EVERY * iso_interval`.
    #[must_use]
    pub fn is_major(&self, iso_value: f64) -> bool {
        let period = Self::MAJOR_EVERY * self.iso_interval;
        if period <= 0.0 || !period.is_finite() {
            return false;
        }
        let ratio = iso_value / period;
        (ratio - ratio.round()).abs() < 1e-9
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.step_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "step_size must be at least 1".to_string(),
            ));
        }
        if !(self.iso_interval.is_finite() && self.iso_interval > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "iso_interval must be positive and finite, got {}",
                self.iso_interval
            )));
        }
        if !(self.max_iso.is_finite() && self.max_iso > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_iso must be positive and finite, got {}",
                self.max_iso
            )));
        }
        if self.max_iso / self.iso_interval > f64::from(Self::MAX_LEVEL_COUNT) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_iso / iso_interval must not exceed {} levels, got {}",
                Self::MAX_LEVEL_COUNT,
                self.max_iso / self.iso_interval
            )));
        }
        if let Some(radius) = self.search_radius
            && !(radius.is_finite() && radius > 0.0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "search_radius must be positive and finite, got {radius}"
            )));
        }
        if !(self.min_accepted_extent.is_finite() && self.min_accepted_extent >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_accepted_extent must be non-negative and finite, got {}",
                self.min_accepted_extent
            )));
        }
        Ok(())
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            max_iso: Self::DEFAULT_MAX_ISO,
            iso_interval: Self::DEFAULT_ISO_INTERVAL,
            step_size: Self::DEFAULT_STEP_SIZE,
            search_radius: None,
            min_accepted_extent: Self::DEFAULT_MIN_ACCEPTED_EXTENT,
            stitch_policy: StitchPolicy::default(),
            knot_settle_index: Self::DEFAULT_KNOT_SETTLE_INDEX,
            smoothing_passes: Self::DEFAULT_SMOOTHING_PASSES,
        }
    }
}

/// A finished contour line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// The smoothed polyline.
    pub polyline: Polyline,
    /// The height this contour traces.
    pub iso_value: f64,
    /// Whether this is a major (index) contour, drawn thicker by
    /// renderers.
    pub major: bool,
}

/// Every contour produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    /// Accepted contours, highest level first.
    pub contours: Vec<Contour>,
    /// All iso-values that were swept, highest first. Levels without an
    /// accepted contour appear here but not in `contours`.
    pub levels: Vec<f64>,
    /// Dimensions of the source height field.
    pub dimensions: Dimensions,
}

impl ContourSet {
    /// Returns `true` if no contour was accepted at any level.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Distinct iso-values that have at least one contour, highest first.
    #[must_use]
    pub fn populated_levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = Vec::new();
        for contour in &self.contours {
            if levels.last() != Some(&contour.iso_value) {
                levels.push(contour.iso_value);
            }
        }
        levels
    }

    /// Contours at exactly the given iso-value.
    pub fn at_level(&self, iso_value: f64) -> impl Iterator<Item = &Contour> {
        self.contours
            .iter()
            .filter(move |c| c.iso_value == iso_value)
    }

    /// Total number of points across all contours.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.contours.iter().map(|c| c.polyline.len()).sum()
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input height map image.
    #[error("failed to decode height map: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The height field has zero width or height.
    #[error("height field is empty ({width}x{height})")]
    EmptyField {
        /// Field width in samples.
        width: u32,
        /// Field height in samples.
        height: u32,
    },

    /// A sample buffer does not match the declared field dimensions.
    #[error("height field expects {expected} samples, got {actual}")]
    FieldSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance_squared() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_lerp_midpoint() {
        let p = Point::new(2.0, 4.0).lerp(Point::new(4.0, 8.0), 0.5);
        assert_eq!(p, Point::new(3.0, 6.0));
    }

    #[test]
    fn point_lerp_endpoints() {
        let a = Point::new(1.0, -1.0);
        let b = Point::new(5.0, 7.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    // --- Polyline tests ---

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert_eq!(pl.len(), 0);
        assert!(pl.first().is_none());
        assert!(pl.last().is_none());
    }

    #[test]
    fn polyline_first_and_last() {
        let pl = Polyline::new(vec![
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        ]);
        assert_eq!(pl.first(), Some(&Point::new(1.0, 2.0)));
        assert_eq!(pl.last(), Some(&Point::new(5.0, 6.0)));
        assert_eq!(pl.into_points().len(), 3);
    }

    #[test]
    fn segment_degenerate() {
        let p = Point::new(1.0, 1.0);
        assert!(Segment::new(p, p, 10.0).is_degenerate());
        assert!(!Segment::new(p, Point::new(1.0, 1.5), 10.0).is_degenerate());
    }

    // --- ContourConfig tests ---

    #[test]
    fn config_defaults() {
        let config = ContourConfig::default();
        assert!((config.max_iso - 250.0).abs() < f64::EPSILON);
        assert!((config.iso_interval - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.step_size, 3);
        assert!(config.search_radius.is_none());
        assert!((config.min_accepted_extent - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.stitch_policy, StitchPolicy::FirstMatch);
        assert_eq!(config.knot_settle_index, 1);
        assert_eq!(config.smoothing_passes, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn search_radius_defaults_to_half_step() {
        let config = ContourConfig {
            step_size: 4,
            ..ContourConfig::default()
        };
        assert!((config.effective_search_radius() - 2.0).abs() < f64::EPSILON);

        let explicit = ContourConfig {
            search_radius: Some(0.75),
            ..config
        };
        assert!((explicit.effective_search_radius() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn levels_sweep_down_to_but_excluding_zero() {
        let config = ContourConfig {
            max_iso: 200.0,
            iso_interval: 50.0,
            ..ContourConfig::default()
        };
        assert_eq!(config.levels(), vec![200.0, 150.0, 100.0, 50.0]);
    }

    #[test]
    fn levels_with_uneven_interval() {
        let config = ContourConfig {
            max_iso: 10.0,
            iso_interval: 4.0,
            ..ContourConfig::default()
        };
        assert_eq!(config.levels(), vec![10.0, 6.0, 2.0]);
    }

    #[test]
    fn default_levels_count() {
        // 250, 246, ..., 2 -> 63 levels.
        let levels = ContourConfig::default().levels();
        assert_eq!(levels.len(), 63);
        assert!((levels[62] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn major_levels_are_multiples_of_five_intervals() {
        let config = ContourConfig::default();
        assert!(config.is_major(200.0));
        assert!(config.is_major(220.0));
        assert!(!config.is_major(246.0));
        assert!(!config.is_major(250.0));
    }

    #[test]
    fn validate_rejects_zero_step() {
        let config = ContourConfig {
            step_size: 0,
            ..ContourConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_non_positive_interval() {
        for interval in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let config = ContourConfig {
                iso_interval: interval,
                ..ContourConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "interval {interval} should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_radius_and_extent() {
        let radius = ContourConfig {
            search_radius: Some(0.0),
            ..ContourConfig::default()
        };
        assert!(radius.validate().is_err());

        let extent = ContourConfig {
            min_accepted_extent: -1.0,
            ..ContourConfig::default()
        };
        assert!(extent.validate().is_err());
    }

    #[test]
    fn validate_rejects_unbounded_level_count() {
        let config = ContourConfig {
            max_iso: 1e20,
            iso_interval: 1.0,
            ..ContourConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("100000 levels"), "{err}");
    }

    #[test]
    fn validate_accepts_level_count_at_limit() {
        let config = ContourConfig {
            max_iso: f64::from(ContourConfig::MAX_LEVEL_COUNT),
            iso_interval: 1.0,
            ..ContourConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.levels().len(), 100_000);
    }

    #[test]
    fn levels_are_capped_without_validation() {
        let config = ContourConfig {
            max_iso: 1e20,
            iso_interval: 1.0,
            ..ContourConfig::default()
        };
        assert_eq!(config.levels().len(), 100_000);
    }

    // --- ContourSet tests ---

    fn contour(iso_value: f64, n: usize) -> Contour {
        #[allow(clippy::cast_precision_loss)]
        let points = (0..n).map(|i| Point::new(i as f64, 0.0)).collect();
        Contour {
            polyline: Polyline::new(points),
            iso_value,
            major: false,
        }
    }

    #[test]
    fn contour_set_levels_and_counts() {
        let set = ContourSet {
            contours: vec![contour(100.0, 4), contour(100.0, 5), contour(50.0, 6)],
            levels: vec![150.0, 100.0, 50.0],
            dimensions: Dimensions {
                width: 10,
                height: 10,
            },
        };
        assert!(!set.is_empty());
        assert_eq!(set.populated_levels(), vec![100.0, 50.0]);
        assert_eq!(set.at_level(100.0).count(), 2);
        assert_eq!(set.at_level(150.0).count(), 0);
        assert_eq!(set.total_points(), 15);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::InvalidConfig("step_size must be at least 1".to_string()).to_string(),
            "invalid pipeline configuration: step_size must be at least 1",
        );
        assert_eq!(
            PipelineError::EmptyField {
                width: 0,
                height: 5
            }
            .to_string(),
            "height field is empty (0x5)",
        );
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }

    // --- Serde round-trip tests ---

    #[test]
    fn config_serde_round_trip() {
        let config = ContourConfig {
            max_iso: 120.0,
            iso_interval: 10.0,
            step_size: 2,
            search_radius: Some(0.8),
            min_accepted_extent: 15.0,
            stitch_policy: StitchPolicy::NearestMatch,
            knot_settle_index: 2,
            smoothing_passes: 3,
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ContourConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn config_deserializes_partial_json_with_defaults() {
        let config: ContourConfig = serde_json::from_str(r#"{"step_size": 5}"#).unwrap();
        assert_eq!(config.step_size, 5);
        assert!((config.max_iso - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn contour_set_serde_round_trip() {
        let set = ContourSet {
            contours: vec![Contour {
                polyline: Polyline::new(vec![Point::new(0.5, 1.5), Point::new(2.0, 3.25)]),
                iso_value: 20.0,
                major: true,
            }],
            levels: vec![20.0],
            dimensions: Dimensions {
                width: 4,
                height: 4,
            },
        };
        let json = serde_json::to_string(&set).unwrap();
        let deserialized: ContourSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, deserialized);
    }
}
