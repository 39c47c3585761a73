//! Iso-level sweep orchestration.
//!
//! Levels are independent of one another: each one sweeps the grid,
//! stitches its own segments and post-processes its own polylines. With
//! the `parallel` feature the levels run on the rayon thread pool; the
//! output is collected in level order either way.

use std::time::Duration;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagnostics::{Clock, LevelDiagnostics, StageDiagnostics, StageMetrics};
use crate::height_field::HeightField;
use crate::postprocess::post_process_all;
use crate::segment::{LevelSegments, sweep};
use crate::stitch::Stitcher;
use crate::types::{Contour, ContourConfig, ContourSet, PipelineError, Polyline};

/// `Sync` when the `parallel` feature is enabled, otherwise implemented
/// for every type.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}

/// `Sync` when the `parallel` feature is enabled, otherwise implemented
/// for every type.
#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// A clock that never advances. Used when nobody asked for timings.
pub(crate) struct NoClock;

impl Clock for NoClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _: &()) -> Duration {
        Duration::ZERO
    }
}

/// Contours and diagnostics for one level.
struct LevelOutcome {
    contours: Vec<Contour>,
    diagnostics: LevelDiagnostics,
}

/// Extract, stitch and post-process a single iso-level.
fn process_level<F, C>(field: &F, iso: f64, config: &ContourConfig, clock: &C) -> LevelOutcome
where
    F: HeightField + ?Sized,
    C: Clock + ?Sized,
{
    let major = config.is_major(iso);

    let start = clock.now();
    let LevelSegments {
        segments,
        cell_count,
        skipped,
    } = sweep(field, iso, config.step_size);
    let extraction = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Extraction {
            cell_count,
            segment_count: segments.len(),
            skipped_count: skipped,
        },
    };

    let start = clock.now();
    let search_radius = config.effective_search_radius();
    let polylines = config.stitch_policy.stitch(&segments, search_radius);
    let stitching = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Stitching {
            policy: config.stitch_policy.to_string(),
            search_radius,
            polyline_count: polylines.len(),
            point_count: polylines.iter().map(Polyline::len).sum(),
        },
    };
    let polyline_count = polylines.len();

    let start = clock.now();
    let (kept, stats) = post_process_all(polylines, config);
    let post_processing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::PostProcessing(stats),
    };

    tracing::debug!(
        iso,
        major,
        segments = segments.len(),
        skipped,
        polylines = polyline_count,
        accepted = stats.accepted,
        rejected = stats.rejected,
        knots = stats.knots_removed,
        "processed level"
    );

    LevelOutcome {
        contours: kept
            .into_iter()
            .map(|polyline| Contour {
                polyline,
                iso_value: iso,
                major,
            })
            .collect(),
        diagnostics: LevelDiagnostics {
            iso_value: iso,
            major,
            extraction,
            stitching,
            post_processing,
        },
    }
}

/// Validate, sweep every level and assemble the contour set.
///
/// Returns per-level diagnostics alongside the contours; with
/// [`NoClock`] every duration in them is zero.
pub(crate) fn run_levels<F, C>(
    field: &F,
    config: &ContourConfig,
    clock: &C,
) -> Result<(ContourSet, Vec<LevelDiagnostics>), PipelineError>
where
    F: HeightField + MaybeSync + ?Sized,
    C: Clock + MaybeSync + ?Sized,
{
    config.validate()?;
    let dimensions = field.dimensions();
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(PipelineError::EmptyField {
            width: dimensions.width,
            height: dimensions.height,
        });
    }

    let levels = config.levels();
    tracing::debug!(
        width = dimensions.width,
        height = dimensions.height,
        levels = levels.len(),
        step_size = config.step_size,
        search_radius = config.effective_search_radius(),
        policy = %config.stitch_policy,
        "starting contour sweep"
    );

    #[cfg(feature = "parallel")]
    let outcomes: Vec<LevelOutcome> = levels
        .par_iter()
        .map(|&iso| process_level(field, iso, config, clock))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<LevelOutcome> = levels
        .iter()
        .map(|&iso| process_level(field, iso, config, clock))
        .collect();

    let mut contours = Vec::new();
    let mut diagnostics = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        contours.extend(outcome.contours);
        diagnostics.push(outcome.diagnostics);
    }

    tracing::debug!(contours = contours.len(), "contour sweep finished");

    Ok((
        ContourSet {
            contours,
            levels,
            dimensions,
        },
        diagnostics,
    ))
}
