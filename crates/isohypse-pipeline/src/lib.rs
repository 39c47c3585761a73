//! isohypse-pipeline: contour extraction from height fields (sans-IO).
//!
//! Turns a scalar height field into topographic contour lines through:
//! marching-squares classification -> segment interpolation ->
//! stitching -> extent filter -> knot removal -> Bezier smoothing,
//! repeated for every iso-level from `max_iso` down to zero.
//!
//! This crate has **no I/O dependencies**. It samples any
//! [`HeightField`] (or decodes image bytes already in memory) and
//! returns a [`ContourSet`]. Rendering lives in `isohypse-export`.
//!
//! With the `parallel` feature the iso-levels are processed on the
//! rayon thread pool. The result is identical to a sequential run.

pub mod classify;
pub mod diagnostics;
pub mod filter;
pub mod height_field;
pub mod knot;
pub mod pipeline;
pub mod postprocess;
pub mod segment;
pub mod smooth;
pub mod stitch;
pub mod types;

pub use height_field::{Grid, HeightField, decode_height_field};
pub use pipeline::MaybeSync;
pub use stitch::{StitchPolicy, Stitcher};
pub use types::{
    Contour, ContourConfig, ContourSet, Dimensions, GrayImage, PipelineError, Point, Polyline,
    Segment,
};

/// Extract every contour of `field`.
///
/// # Pipeline steps
///
/// For each iso-level, highest first:
///
/// 1. Sweep the grid in `step_size` cells and classify each cell
/// 2. Interpolate crossing segments (saddles resolved by `a*c - b*d`)
/// 3. Stitch segments into polylines (pluggable [`StitchPolicy`])
/// 4. Drop polylines below the minimum extent
/// 5. Collapse knots
/// 6. Smooth with quadratic then cubic Bezier corner cutting
///
/// Levels that produce no accepted polyline are absent from
/// [`ContourSet::contours`] but still listed in [`ContourSet::levels`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`ContourConfig::validate`].
/// Returns [`PipelineError::EmptyField`] if the field has zero width or
/// height.
pub fn run<F>(field: &F, config: &ContourConfig) -> Result<ContourSet, PipelineError>
where
    F: HeightField + MaybeSync + ?Sized,
{
    let (set, _) = pipeline::run_levels(field, config, &pipeline::NoClock)?;
    Ok(set)
}

/// Decode image bytes as an 8-bit height map and extract its contours.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Otherwise the same as [`run`].
pub fn process(image_bytes: &[u8], config: &ContourConfig) -> Result<ContourSet, PipelineError> {
    let field = decode_height_field(image_bytes)?;
    run(&field, config)
}
