//! Pipeline diagnostics: timing and counts for every iso-level.
//!
//! [`run_with_diagnostics`] and [`process_with_diagnostics`] return the
//! same [`ContourSet`] as [`run`](crate::run) and
//! [`process`](crate::process), alongside a [`PipelineDiagnostics`]
//! record of how long each stage took on each level and what it
//! produced.
//!
//! Timestamps come from a caller-supplied [`Clock`]. [`WebClock`] uses
//! the `web-time` crate, which maps to `performance.now()` on WASM and
//! `std::time::Instant` elsewhere.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::height_field::{HeightField, decode_height_field};
use crate::pipeline::{MaybeSync, run_levels};
use crate::postprocess::PostProcessStats;
use crate::types::{ContourConfig, ContourSet, PipelineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// An opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding. `None` when the pipeline was handed a height
    /// field directly.
    pub decode: Option<StageDiagnostics>,
    /// One entry per swept level, highest first.
    pub levels: Vec<LevelDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all levels.
    pub summary: PipelineSummary,
}

/// Diagnostics for one iso-level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDiagnostics {
    /// The iso-value swept.
    pub iso_value: f64,
    /// Whether the level is a major contour level.
    pub major: bool,
    /// Cell sweep and segment extraction.
    pub extraction: StageDiagnostics,
    /// Segment stitching.
    pub stitching: StageDiagnostics,
    /// Extent filter, knot removal and smoothing.
    pub post_processing: StageDiagnostics,
}

impl LevelDiagnostics {
    /// Segments extracted on this level.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        match self.extraction.metrics {
            StageMetrics::Extraction { segment_count, .. } => segment_count,
            _ => 0,
        }
    }

    /// Contours accepted on this level.
    #[must_use]
    pub fn accepted_count(&self) -> usize {
        match self.post_processing.metrics {
            StageMetrics::PostProcessing(stats) => stats.accepted,
            _ => 0,
        }
    }
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Cell sweep and segment extraction metrics.
    Extraction {
        /// Grid cells visited.
        cell_count: usize,
        /// Segments produced.
        segment_count: usize,
        /// Degenerate or undefined segments dropped.
        skipped_count: usize,
    },
    /// Stitching metrics.
    Stitching {
        /// Which stitch policy was used.
        policy: String,
        /// Endpoint matching radius.
        search_radius: f64,
        /// Polylines produced.
        polyline_count: usize,
        /// Points across all polylines.
        point_count: usize,
    },
    /// Post-processing metrics.
    PostProcessing(PostProcessStats),
}

/// High-level summary counts for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Height field width in samples.
    pub field_width: u32,
    /// Height field height in samples.
    pub field_height: u32,
    /// Number of iso-levels swept.
    pub level_count: usize,
    /// Number of iso-levels with at least one accepted contour.
    pub populated_level_count: usize,
    /// Segments extracted across all levels.
    pub segment_count: usize,
    /// Accepted contours across all levels.
    pub contour_count: usize,
    /// Points across all accepted contours.
    pub total_point_count: usize,
}

impl PipelineDiagnostics {
    /// Stage durations summed over every level, in pipeline order.
    ///
    /// Decoding is listed only when it ran.
    #[must_use]
    pub fn stage_totals(&self) -> Vec<(&'static str, Duration)> {
        let sum = |f: fn(&LevelDiagnostics) -> Duration| -> Duration {
            self.levels.iter().map(f).sum()
        };
        let mut totals = Vec::with_capacity(4);
        if let Some(ref decode) = self.decode {
            totals.push(("Decode", decode.duration));
        }
        totals.push(("Extraction", sum(|l| l.extraction.duration)));
        totals.push(("Stitching", sum(|l| l.stitching.duration)));
        totals.push(("Post-processing", sum(|l| l.post_processing.duration)));
        totals
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Field: {}x{} ({} samples)",
            self.summary.field_width,
            self.summary.field_height,
            u64::from(self.summary.field_width) * u64::from(self.summary.field_height),
        ));
        lines.push(format!(
            "Levels: {} swept, {} populated",
            self.summary.level_count, self.summary.populated_level_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!("{:<24} {:>10} {:>10}", "Stage", "Duration", "% Total"));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, duration) in self.stage_totals() {
            let ms = duration_ms(duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%"));
        }
        if let Some(StageDiagnostics { ref metrics, .. }) = self.decode {
            lines.push(format!("{:<24} {}", "", format_metrics(metrics)));
        }

        lines.push(String::new());
        lines.push(format!("{:<10} {:>10}  {}", "Level", "Duration", "Details"));
        lines.push("-".repeat(80));
        for level in &self.levels {
            let duration = level.extraction.duration
                + level.stitching.duration
                + level.post_processing.duration;
            let ms = duration_ms(duration);
            let marker = if level.major { '*' } else { ' ' };
            lines.push(format!(
                "{:>8.2} {marker} {ms:>8.3}ms  {} | {} | {}",
                level.iso_value,
                format_metrics(&level.extraction.metrics),
                format_metrics(&level.stitching.metrics),
                format_metrics(&level.post_processing.metrics),
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Points: {}  |  Segments: {}",
            self.summary.contour_count, self.summary.total_point_count, self.summary.segment_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Extraction {
            cell_count,
            segment_count,
            skipped_count,
        } => format!("{cell_count} cells, {segment_count} segs ({skipped_count} skipped)"),
        StageMetrics::Stitching {
            policy,
            search_radius,
            polyline_count,
            point_count,
        } => format!("{policy} r={search_radius:.2} {polyline_count} polys, {point_count} pts"),
        StageMetrics::PostProcessing(stats) => format!(
            "kept {}/{} knots={} {}->{} pts",
            stats.accepted,
            stats.accepted + stats.rejected,
            stats.knots_removed,
            stats.points_before,
            stats.points_after,
        ),
    }
}

/// Run the pipeline on a height field, collecting diagnostics.
///
/// # Errors
///
/// Same as [`run`](crate::run).
pub fn run_with_diagnostics<F, C>(
    field: &F,
    config: &ContourConfig,
    clock: &C,
) -> Result<(ContourSet, PipelineDiagnostics), PipelineError>
where
    F: HeightField + MaybeSync + ?Sized,
    C: Clock + MaybeSync,
{
    let start = clock.now();
    let (set, levels) = run_levels(field, config, clock)?;
    let total_duration = clock.elapsed(&start);
    let diagnostics = assemble(&set, None, levels, total_duration);
    Ok((set, diagnostics))
}

/// Decode image bytes and run the pipeline, collecting diagnostics.
///
/// # Errors
///
/// Same as [`process`](crate::process).
pub fn process_with_diagnostics<C: Clock + MaybeSync>(
    image_bytes: &[u8],
    config: &ContourConfig,
    clock: &C,
) -> Result<(ContourSet, PipelineDiagnostics), PipelineError> {
    let start = clock.now();

    let decode_start = clock.now();
    let field = decode_height_field(image_bytes)?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&decode_start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: field.width(),
            height: field.height(),
        },
    };

    let (set, levels) = run_levels(&field, config, clock)?;
    let total_duration = clock.elapsed(&start);
    let diagnostics = assemble(&set, Some(decode), levels, total_duration);
    Ok((set, diagnostics))
}

fn assemble(
    set: &ContourSet,
    decode: Option<StageDiagnostics>,
    levels: Vec<LevelDiagnostics>,
    total_duration: Duration,
) -> PipelineDiagnostics {
    let summary = PipelineSummary {
        field_width: set.dimensions.width,
        field_height: set.dimensions.height,
        level_count: levels.len(),
        populated_level_count: levels.iter().filter(|l| l.accepted_count() > 0).count(),
        segment_count: levels.iter().map(LevelDiagnostics::segment_count).sum(),
        contour_count: set.contours.len(),
        total_point_count: set.total_points(),
    };
    PipelineDiagnostics {
        decode,
        levels,
        total_duration,
        summary,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::height_field::Grid;

    fn level(iso_value: f64, major: bool, accepted: usize) -> LevelDiagnostics {
        LevelDiagnostics {
            iso_value,
            major,
            extraction: StageDiagnostics {
                duration: Duration::from_millis(3),
                metrics: StageMetrics::Extraction {
                    cell_count: 100,
                    segment_count: 40,
                    skipped_count: 1,
                },
            },
            stitching: StageDiagnostics {
                duration: Duration::from_millis(2),
                metrics: StageMetrics::Stitching {
                    policy: "first-match".to_string(),
                    search_radius: 1.5,
                    polyline_count: 2,
                    point_count: 42,
                },
            },
            post_processing: StageDiagnostics {
                duration: Duration::from_millis(1),
                metrics: StageMetrics::PostProcessing(PostProcessStats {
                    accepted,
                    rejected: 2 - accepted,
                    knots_removed: 0,
                    points_before: 42,
                    points_after: 30,
                }),
            },
        }
    }

    fn sample_diagnostics() -> PipelineDiagnostics {
        PipelineDiagnostics {
            decode: Some(StageDiagnostics {
                duration: Duration::from_millis(4),
                metrics: StageMetrics::Decode {
                    input_bytes: 1000,
                    width: 64,
                    height: 48,
                },
            }),
            levels: vec![level(20.0, true, 1), level(16.0, false, 0)],
            total_duration: Duration::from_millis(20),
            summary: PipelineSummary {
                field_width: 64,
                field_height: 48,
                level_count: 2,
                populated_level_count: 1,
                segment_count: 80,
                contour_count: 1,
                total_point_count: 30,
            },
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn stage_totals_sum_over_levels() {
        let totals = sample_diagnostics().stage_totals();
        let names: Vec<&str> = totals.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["Decode", "Extraction", "Stitching", "Post-processing"]
        );
        assert_eq!(totals[1].1, Duration::from_millis(6));
        assert_eq!(totals[3].1, Duration::from_millis(2));
    }

    #[test]
    fn stage_totals_omit_decode_when_absent() {
        let mut diag = sample_diagnostics();
        diag.decode = None;
        assert_eq!(diag.stage_totals()[0].0, "Extraction");
    }

    #[test]
    fn report_contains_levels_and_stages() {
        let report = sample_diagnostics().report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("Field: 64x48 (3072 samples)"));
        assert!(report.contains("Levels: 2 swept, 1 populated"));
        assert!(report.contains("Stitching"));
        assert!(report.contains("first-match r=1.50"));
        assert!(report.contains("20.00 *"));
        assert!(report.contains("16.00  "));
        assert!(report.contains("kept 1/2"));
        assert!(report.contains("1000 bytes -> 64x48"));
        assert!(report.contains("Contours: 1  |  Points: 30  |  Segments: 80"));
    }

    #[test]
    fn level_counts_read_metrics() {
        let l = level(10.0, false, 1);
        assert_eq!(l.segment_count(), 40);
        assert_eq!(l.accepted_count(), 1);
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let json = serde_json::to_value(sample_diagnostics()).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.02).abs() < 1e-12);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_duration, Duration::from_millis(20));
        assert_eq!(back.levels.len(), 2);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{"duration": -1.0, "metrics": {"Decode": {"input_bytes": 0, "width": 1, "height": 1}}}"#;
        assert!(serde_json::from_str::<StageDiagnostics>(json).is_err());
    }

    #[test]
    fn run_with_diagnostics_matches_run() {
        let field = Grid::from_fn(16, 16, |x, y| f64::from(x + y) * 4.0);
        let config = ContourConfig {
            max_iso: 100.0,
            iso_interval: 20.0,
            step_size: 2,
            min_accepted_extent: 1.0,
            ..ContourConfig::default()
        };
        let (set, diag) = run_with_diagnostics(&field, &config, &WebClock).unwrap();
        assert_eq!(set, crate::run(&field, &config).unwrap());
        assert_eq!(diag.levels.len(), config.levels().len());
        assert!(diag.decode.is_none());
        assert_eq!(diag.summary.contour_count, set.contours.len());
        assert_eq!(diag.summary.total_point_count, set.total_points());
        assert_eq!(diag.summary.populated_level_count, set.populated_levels().len());
    }

    #[test]
    fn process_with_diagnostics_records_decode() {
        let img =
            image::GrayImage::from_fn(8, 8, |x, _| image::Luma([u8::try_from(x * 30).unwrap()]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        let config = ContourConfig {
            max_iso: 200.0,
            iso_interval: 50.0,
            step_size: 1,
            min_accepted_extent: 0.0,
            ..ContourConfig::default()
        };
        let (set, diag) = process_with_diagnostics(&bytes, &config, &WebClock).unwrap();
        let decode = diag.decode.unwrap();
        assert!(matches!(
            decode.metrics,
            StageMetrics::Decode {
                width: 8,
                height: 8,
                ..
            }
        ));
        assert_eq!(diag.summary.field_width, 8);
        assert_eq!(diag.summary.contour_count, set.contours.len());
    }

    #[test]
    fn process_with_diagnostics_propagates_decode_error() {
        let result = process_with_diagnostics(&[], &ContourConfig::default(), &WebClock);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
