extern crate clap;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use error_stack::Report;
use log::info;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use trackthin::track::{markers_json, read_track, simplify_markers, write_simplified, InputFormat};
use trackthin::{Dimensions, TrackError};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Geojson,
    SensorLogger,
}

impl From<Format> for InputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Auto => InputFormat::Auto,
            Format::Geojson => InputFormat::GeoJson,
            Format::SensorLogger => InputFormat::SensorLogger,
        }
    }
}

#[derive(Parser)]
#[clap(version, about = "Reduce the number of points in GPS tracks")]
struct Opts {
    /// GeoJSON or Sensor Logger JSON files
    #[clap(required = true)]
    files: Vec<PathBuf>,

    /// Simplification tolerance, in coordinate units; <= 0 keeps every point
    #[clap(short, long, default_value = "-1.0", allow_negative_numbers = true)]
    tolerance: f64,

    /// Run the radial distance pre-pass (faster, lower quality)
    #[clap(short, long, default_value = "false")]
    fast: bool,

    /// Number of axes to measure distances in
    #[clap(long, default_value = "3", value_parser = clap::value_parser!(u8).range(2..=3))]
    dims: u8,

    /// Input format
    #[clap(long, value_enum, default_value = "auto")]
    format: Format,

    /// Print the retained indices of each file as JSON
    #[clap(short, long)]
    markers: bool,

    /// Write retained Sensor Logger records as CSV too
    #[clap(long)]
    csv: bool,

    /// Output directory (defaults to the directory of each input)
    #[clap(short, long)]
    out_dir: Option<PathBuf>,

    /// Number of CPU threads
    #[clap(short, long, default_value = "4")]
    ncpu: usize,

    /// Show detailed logging
    #[clap(short, long)]
    debug: bool,
}

struct Outcome {
    path: PathBuf,
    markers: Vec<usize>,
}

fn process(path: &Path, opts: &Opts) -> Result<Outcome, Report<TrackError>> {
    let track = read_track(path, opts.format.into())?;

    let dimensions = if opts.dims == 2 { Dimensions::Two } else { Dimensions::Three };
    let markers = simplify_markers(&track, opts.tolerance, opts.fast, dimensions)
        .map_err(|e| e.change_context(TrackError::Simplify))
        .map_err(|e| e.attach_printable(format!("path: {}", path.display())))?;

    let kept = track.retain(&markers);
    write_simplified(&kept, path, opts.out_dir.as_deref(), opts.csv)?;

    info!(
        "{}: {} -> {} points with tolerance={}",
        path.display(),
        track.len(),
        kept.len(),
        opts.tolerance
    );

    Ok(Outcome { path: path.to_path_buf(), markers })
}

fn main() -> Result<(), Report<TrackError>> {
    let opts: Opts = Opts::parse();

    let level = if opts.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    ThreadPoolBuilder::new()
        .num_threads(opts.ncpu)
        .build_global()
        .map_err(|e| Report::new(e).change_context(TrackError::ThreadPool))?;

    let outcomes = opts
        .files
        .par_iter()
        .map(|path| process(path, &opts))
        .collect::<Result<Vec<_>, _>>()?;

    if opts.markers {
        for outcome in &outcomes {
            println!("{}", markers_json(&outcome.path, &outcome.markers));
        }
    }

    Ok(())
}
