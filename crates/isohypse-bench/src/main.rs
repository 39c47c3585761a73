//! isohypse-bench: CLI tool for contour parameter experimentation and diagnostics.
//!
//! Runs the contour pipeline on a height-map image with configurable
//! parameters, printing per-level diagnostics. Useful for:
//!
//! - Comparing stitching policies (`first` vs `nearest`)
//! - Tuning the iso interval, grid step and minimum extent
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin isohypse-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=isohypse_pipeline=debug` to see per-level log lines.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use isohypse_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use isohypse_pipeline::{ContourConfig, ContourSet, StitchPolicy};
use tracing_subscriber::EnvFilter;

/// Contour extraction experimentation and diagnostics for isohypse.
///
/// Traces topographic contour lines through a height-map image and
/// prints per-level timing and count diagnostics.
#[derive(Parser)]
#[command(name = "isohypse-bench", version)]
struct Cli {
    /// Path to the height-map image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Highest iso-value to trace.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_MAX_ISO)]
    max_iso: f64,

    /// Distance between consecutive iso-values.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_ISO_INTERVAL)]
    iso_interval: f64,

    /// Grid cell size in samples.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_STEP_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    step_size: u32,

    /// Endpoint matching radius for stitching (default: half the step size).
    #[arg(long)]
    search_radius: Option<f64>,

    /// Minimum mean squared spread of an accepted contour.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_MIN_ACCEPTED_EXTENT)]
    min_accepted_extent: f64,

    /// Stitching policy.
    #[arg(long, value_enum, default_value_t = Stitch::First)]
    stitch: Stitch,

    /// First vertex index considered by knot removal.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_KNOT_SETTLE_INDEX)]
    knot_settle_index: usize,

    /// Number of smoothing rounds (0 disables smoothing).
    #[arg(long, default_value_t = ContourConfig::DEFAULT_SMOOTHING_PASSES)]
    smoothing_passes: u32,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the extracted contour set as JSON to file.
    #[arg(long)]
    contours_json: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full contour config as a JSON string.
    ///
    /// When provided, all other contour parameter flags are ignored.
    /// The JSON must be a valid `ContourConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Stitching policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Stitch {
    /// Take the first segment found within the radius.
    First,
    /// Take the closest segment endpoint within the radius.
    Nearest,
}

/// Build a [`ContourConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. The result is validated
/// either way.
fn config_from_cli(cli: &Cli) -> Result<ContourConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        ContourConfig {
            max_iso: cli.max_iso,
            iso_interval: cli.iso_interval,
            step_size: cli.step_size,
            search_radius: cli.search_radius,
            min_accepted_extent: cli.min_accepted_extent,
            stitch_policy: match cli.stitch {
                Stitch::First => StitchPolicy::FirstMatch,
                Stitch::Nearest => StitchPolicy::NearestMatch,
            },
            knot_settle_index: cli.knot_settle_index,
            smoothing_passes: cli.smoothing_passes,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match isohypse_pipeline::diagnostics::process_with_diagnostics(
            &image_bytes,
            &config,
            &StdClock,
        ) {
            Ok((set, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 {
                    if let Some(ref svg_path) = cli.svg {
                        write_svg(svg_path, &cli.image_path, &set, &config);
                    }
                    if let Some(ref json_path) = cli.contours_json {
                        write_contours_json(json_path, &set);
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Render `set` as SVG and write it to `svg_path`, embedding the config.
fn write_svg(svg_path: &Path, image_path: &Path, set: &ContourSet, config: &ContourConfig) {
    let title = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("isohypse");
    let desc = format!(
        "{} contours over {} levels, interval {}",
        set.contours.len(),
        set.levels.len(),
        config.iso_interval,
    );
    let config_json = serde_json::to_string(config).ok();
    let metadata = isohypse_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: config_json.as_deref(),
    };
    let svg = isohypse_export::to_svg(set, &metadata, &isohypse_export::SvgStyle::default());
    match std::fs::write(svg_path, &svg) {
        Ok(()) => {
            eprintln!(
                "SVG written to {} ({} bytes)",
                svg_path.display(),
                svg.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
        }
    }
}

fn write_contours_json(json_path: &Path, set: &ContourSet) {
    let json = match serde_json::to_string(set) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing contours: {e}");
            return;
        }
    };
    match std::fs::write(json_path, &json) {
        Ok(()) => {
            eprintln!(
                "Contours written to {} ({} bytes)",
                json_path.display(),
                json.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing contours to {}: {e}", json_path.display());
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means, in the order the first run reported them.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let per_run: Vec<Vec<(&str, Duration)>> = all_diagnostics
        .iter()
        .map(PipelineDiagnostics::stage_totals)
        .collect();

    for (name, _) in first.stage_totals() {
        let stage_durations: Vec<f64> = per_run
            .iter()
            .filter_map(|totals| totals.iter().find(|(n, _)| *n == name))
            .map(|(_, dur)| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
